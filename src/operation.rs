//! Operation selection: an input means `PUT`, no input means `GET`.
use crate::input::Payload;

/// Object addressed by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub bucket: String,
    pub key: String,
}

impl Target {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug)]
pub enum Operation {
    /// Download the object.
    Get { target: Target },
    /// Upload `body` to the object.
    Put { target: Target, body: Payload },
}

impl Operation {
    pub fn select(target: Target, input: Option<Payload>) -> Self {
        match input {
            Some(body) => Operation::Put { target, body },
            None => Operation::Get { target },
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Operation::Get { .. } => "GET",
            Operation::Put { .. } => "PUT",
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            Operation::Get { target } | Operation::Put { target, .. } => target,
        }
    }
}
