//! Receive outcomes and completion records

use crate::error::StreamError;

/// What a successful receive yields
///
/// A producer failure is not a variant here: it is returned as the `Err`
/// of the receive call, so a receive is `Item | EndOfStream | Err(cause)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal<T> {
    /// The next item, in send order
    Item(T),
    /// The producer completed successfully and every item has been received
    EndOfStream,
}

impl<T> Signal<T> {
    /// Return the item, or `None` at end of stream
    pub fn into_item(self) -> Option<T> {
        match self {
            Signal::Item(item) => Some(item),
            Signal::EndOfStream => None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Signal::EndOfStream)
    }
}

/// How the producing side finished
#[derive(Debug, Clone)]
pub enum Completion {
    Success,
    Failed(StreamError),
}

impl Completion {
    /// The terminal receive outcome this completion maps to
    pub fn to_signal<T>(&self) -> Result<Signal<T>, StreamError> {
        match self {
            Completion::Success => Ok(Signal::EndOfStream),
            Completion::Failed(cause) => Err(cause.clone()),
        }
    }

    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Completion::Success => None,
            Completion::Failed(cause) => Some(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_item() {
        assert_eq!(Signal::Item(3).into_item(), Some(3));
        assert_eq!(Signal::<i32>::EndOfStream.into_item(), None);
        assert!(Signal::<()>::EndOfStream.is_end_of_stream());
    }

    #[test]
    fn test_completion_to_signal() {
        let ok: Result<Signal<u8>, _> = Completion::Success.to_signal();
        assert_eq!(ok.unwrap(), Signal::EndOfStream);

        let failed = Completion::Failed(StreamError::message("boom"));
        let err = failed.to_signal::<u8>().unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(failed.error().is_some());
    }
}
