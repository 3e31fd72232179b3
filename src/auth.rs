use crate::engine::EngineError;

/// The authentication collaborator's verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Privileged,
}

impl Access {
    pub fn from_privileged(is_privileged: bool) -> Self {
        if is_privileged {
            Access::Privileged
        } else {
            Access::Public
        }
    }

    pub fn is_privileged(self) -> bool {
        self == Access::Privileged
    }

    pub fn require_privileged(self) -> Result<(), EngineError> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(EngineError::Unauthorized)
        }
    }
}
