use crate::application_port::RelationError;
use std::future::Future;
use std::time::Duration;

/// Budget applied to every individual store call made by a service.
#[derive(Debug, Clone, Copy)]
pub struct StoreDeadline(pub Duration);

impl StoreDeadline {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub async fn run<T, F>(&self, call: F) -> Result<T, RelationError>
    where
        F: Future<Output = Result<T, RelationError>>,
    {
        tokio::time::timeout(self.0, call)
            .await
            .map_err(|_| RelationError::Store(format!("store call exceeded {:?}", self.0)))?
    }
}

impl Default for StoreDeadline {
    fn default() -> Self {
        Self(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_store_call_becomes_store_error() {
        let deadline = StoreDeadline::from_millis(50);
        let result: Result<(), _> = deadline
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(RelationError::Store(_))));
    }

    #[tokio::test]
    async fn inner_error_passes_through() {
        let result: Result<(), _> = StoreDeadline::default()
            .run(async { Err(RelationError::NotFound("gone".into())) })
            .await;

        assert!(matches!(result, Err(RelationError::NotFound(_))));
    }
}
