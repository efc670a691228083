//! Well-known index field names.

/// Content identifier.
pub const ID: &str = "Id";
/// Version identifier.
pub const VERSION_ID: &str = "VersionId";
/// Content name.
pub const NAME: &str = "Name";
/// Lowercased repository path.
pub const PATH: &str = "Path";
/// Every ancestor path including the content's own.
pub const IN_TREE: &str = "InTree";
/// Parent path.
pub const IN_FOLDER: &str = "InFolder";
/// Number of path segments below the root.
pub const DEPTH: &str = "Depth";
/// Parent content identifier.
pub const PARENT_ID: &str = "ParentId";
/// System content flag.
pub const IS_SYSTEM: &str = "IsSystem";
/// Last public version flag.
pub const IS_LAST_PUBLIC: &str = "IsLastPublic";
/// Last draft version flag.
pub const IS_LAST_DRAFT: &str = "IsLastDraft";
/// Lifespan switch of the content.
pub const ENABLE_LIFESPAN: &str = "EnableLifespan";
/// Start of the validity window.
pub const VALID_FROM: &str = "ValidFrom";
/// End of the validity window; the minimum date means open-ended.
pub const VALID_TILL: &str = "ValidTill";
/// Exact content type name.
pub const TYPE: &str = "Type";
/// Content type and every ancestor type.
pub const TYPE_IS: &str = "TypeIs";
/// Creation timestamp.
pub const CREATION_DATE: &str = "CreationDate";
/// Modification timestamp.
pub const MODIFICATION_DATE: &str = "ModificationDate";
/// Owner identifier.
pub const OWNER_ID: &str = "OwnerId";
/// Catch-all text field addressed by terms without a field name.
pub const ALL_TEXT: &str = "_Text";

/// Fields that must never reach the index.
pub const FORBIDDEN_FIELDS: &[&str] = &["Password", "PasswordHash", "PasswordSalt"];

/// Structural fields whose values are resolved when the document is committed.
pub const POSTPONED_FIELDS: &[&str] =
    &[NAME, PATH, IN_TREE, IN_FOLDER, DEPTH, PARENT_ID, IS_SYSTEM];

/// Returns true if a field with this name must never be indexed.
///
/// The comparison ignores ASCII case.
#[must_use]
pub fn is_forbidden(name: &str) -> bool {
    FORBIDDEN_FIELDS
        .iter()
        .any(|forbidden| forbidden.eq_ignore_ascii_case(name))
}
