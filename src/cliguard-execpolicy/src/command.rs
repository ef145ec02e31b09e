//! Validated command forms.

/// A command that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedCommand {
    /// A single program invocation. Path-like arguments are canonical.
    Simple { program: String, args: Vec<String> },

    /// Operator-joined commands, kept byte-for-byte as submitted. Each
    /// segment was checked on its own; the shell re-parses the whole.
    Composite { text: String },
}

impl ValidatedCommand {
    /// Program name of a simple command.
    pub fn program(&self) -> Option<&str> {
        match self {
            Self::Simple { program, .. } => Some(program),
            Self::Composite { .. } => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite { .. })
    }

    /// Program followed by its arguments, for a simple command.
    pub fn argv(&self) -> Option<Vec<&str>> {
        match self {
            Self::Simple { program, args } => Some(
                std::iter::once(program.as_str())
                    .chain(args.iter().map(String::as_str))
                    .collect(),
            ),
            Self::Composite { .. } => None,
        }
    }
}
