use strata_model::ImageRecord;

/// Which images a caller is entitled to see.
///
/// Scopes never widen each other: a project caller sees its own images plus
/// public ones, an anonymous caller only public ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VisibilityScope {
    /// Administrative context, every live image.
    All,
    /// Images owned by `project_id` or marked public.
    OwnedOrPublic { project_id: String },
    /// Only public images.
    #[default]
    PublicOnly,
}

impl VisibilityScope {
    pub fn owned_or_public(project_id: impl Into<String>) -> Self {
        VisibilityScope::OwnedOrPublic {
            project_id: project_id.into(),
        }
    }

    /// Whether the scope admits `record`. Tombstones are not considered here.
    pub fn admits(&self, record: &ImageRecord) -> bool {
        match self {
            VisibilityScope::All => true,
            VisibilityScope::OwnedOrPublic { project_id } => {
                record.is_public || record.is_owned_by(project_id)
            }
            VisibilityScope::PublicOnly => record.is_public,
        }
    }

    /// Live and admitted by the scope.
    pub fn can_see(&self, record: &ImageRecord) -> bool {
        !record.is_deleted() && self.admits(record)
    }

    /// Whether the caller may modify `record`. Public images stay read-only
    /// for everyone but their owner and administrators.
    pub fn can_modify(&self, record: &ImageRecord) -> bool {
        match self {
            VisibilityScope::All => true,
            VisibilityScope::OwnedOrPublic { project_id } => {
                record.is_owned_by(project_id)
            }
            VisibilityScope::PublicOnly => false,
        }
    }
}
