use anyhow::anyhow;
use courier_api::errors::HandlerError;
use std::error::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_error() {
        let error = HandlerError::rejected("unknown command");

        assert_eq!(error.to_string(), "Message rejected: unknown command");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_failed_error() {
        let error = HandlerError::failed("downstream unavailable");

        assert_eq!(
            error.to_string(),
            "Message handling failed: downstream unavailable"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_from_anyhow() {
        let error: HandlerError = anyhow!("disk full").into();

        assert!(matches!(error, HandlerError::Other(_)));
        assert_eq!(error.to_string(), "disk full");
    }

    #[test]
    fn test_question_mark_conversion() {
        fn fails() -> Result<(), HandlerError> {
            Err(anyhow!("wrapped"))?;
            Ok(())
        }

        let error = fails().unwrap_err();
        assert_eq!(error.to_string(), "wrapped");
    }
}
