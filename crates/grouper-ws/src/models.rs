//! Grouper WS request payloads, response envelopes and result records.

use chrono::NaiveDateTime;
use grouper_core::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grouper boolean flag for "true".
pub const FLAG_TRUE: &str = "T";

/// Format Grouper expects for point-in-time bounds (`yyyy/MM/dd HH:mm:ss.SSS`).
pub const POINT_IN_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// Result codes interpreted by the client.
pub mod result_codes {
    /// Generic success.
    pub const SUCCESS: &str = "SUCCESS";
    /// Subject is a member of the group.
    pub const IS_MEMBER: &str = "IS_MEMBER";
    /// Subject is not a member of the group.
    pub const IS_NOT_MEMBER: &str = "IS_NOT_MEMBER";
    /// Secondary code when the subject is unknown to Grouper.
    pub const SUBJECT_NOT_FOUND: &str = "SUBJECT_NOT_FOUND";
    /// Privilege was granted.
    pub const SUCCESS_ALLOWED: &str = "SUCCESS_ALLOWED";
    /// Privilege was already in place.
    pub const SUCCESS_ALLOWED_ALREADY_EXISTED: &str = "SUCCESS_ALLOWED_ALREADY_EXISTED";
}

/// Format a timestamp as a Grouper point-in-time bound.
#[must_use]
pub fn format_point_in_time(at: &NaiveDateTime) -> String {
    at.format(POINT_IN_TIME_FORMAT).to_string()
}

/// Request body, serialized as `{"<WsRest...Request>": {...}}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum WsRequest {
    /// Point-in-time member listing.
    #[serde(rename = "WsRestGetMembersLiteRequest")]
    GetMembersLite(GetMembersLiteRequest),
    /// Group search.
    #[serde(rename = "WsRestFindGroupsRequest")]
    FindGroups(FindGroupsRequest),
    /// Stem search.
    #[serde(rename = "WsRestFindStemsRequest")]
    FindStems(FindStemsRequest),
    /// Group deletion.
    #[serde(rename = "WsRestGroupDeleteRequest")]
    GroupDelete(GroupDeleteRequest),
    /// Group creation or update.
    #[serde(rename = "WsRestGroupSaveRequest")]
    GroupSave(GroupSaveRequest),
    /// Privilege assignment.
    #[serde(rename = "WsRestAssignGrouperPrivilegesLiteRequest")]
    AssignGrouperPrivilegesLite(AssignPrivilegeRequest),
}

/// Point-in-time bounds for a member listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetMembersLiteRequest {
    /// Start of the range.
    pub point_in_time_from: String,
    /// End of the range.
    pub point_in_time_to: String,
}

impl GetMembersLiteRequest {
    /// Build bounds from timestamps; an absent end means an exact point in time.
    #[must_use]
    pub fn between(from: &NaiveDateTime, to: Option<&NaiveDateTime>) -> Self {
        Self {
            point_in_time_from: format_point_in_time(from),
            point_in_time_to: format_point_in_time(to.unwrap_or(from)),
        }
    }
}

/// Group query filter types.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryFilterType {
    /// Groups directly below a stem.
    FindByStemName,
    /// Group whose name matches exactly.
    FindByGroupNameExact,
    /// Groups whose name contains the search term.
    FindByGroupNameApproximate,
}

/// Group search filter.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Filter type.
    pub query_filter_type: QueryFilterType,
    /// Stem to search in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem_name: Option<String>,
    /// Group name to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// Group search request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindGroupsRequest {
    /// Search filter.
    pub ws_query_filter: QueryFilter,
}

impl FindGroupsRequest {
    /// Groups below `stem`.
    #[must_use]
    pub fn by_stem(stem: impl Into<String>) -> Self {
        Self {
            ws_query_filter: QueryFilter {
                query_filter_type: QueryFilterType::FindByStemName,
                stem_name: Some(stem.into()),
                group_name: None,
            },
        }
    }

    /// Groups matching `name`, exactly or as a substring.
    #[must_use]
    pub fn by_name(name: impl Into<String>, exact: bool) -> Self {
        let query_filter_type = if exact {
            QueryFilterType::FindByGroupNameExact
        } else {
            QueryFilterType::FindByGroupNameApproximate
        };
        Self {
            ws_query_filter: QueryFilter {
                query_filter_type,
                stem_name: None,
                group_name: Some(name.into()),
            },
        }
    }
}

/// Stem query filter types.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StemQueryFilterType {
    /// Stems whose name contains the search term.
    FindByStemNameApproximate,
}

/// Stem search filter.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StemQueryFilter {
    /// Filter type.
    pub stem_query_filter_type: StemQueryFilterType,
    /// Stem name to match.
    pub stem_name: String,
}

/// Stem search request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindStemsRequest {
    /// Search filter.
    pub ws_stem_query_filter: StemQueryFilter,
}

impl FindStemsRequest {
    /// Stems matching `stem` approximately.
    #[must_use]
    pub fn by_stem(stem: impl Into<String>) -> Self {
        Self {
            ws_stem_query_filter: StemQueryFilter {
                stem_query_filter_type: StemQueryFilterType::FindByStemNameApproximate,
                stem_name: stem.into(),
            },
        }
    }
}

/// Reference to a group by name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupLookup {
    /// Full group name.
    pub group_name: String,
}

/// Group deletion request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupDeleteRequest {
    /// Groups to delete.
    pub ws_group_lookups: Vec<GroupLookup>,
}

/// Operand of a composite group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupRef {
    /// Full group name.
    pub name: String,
}

/// Composite membership definition.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeDetail {
    /// Set operation.
    pub composite_type: CompositeType,
    /// Always [`FLAG_TRUE`].
    pub has_composite: String,
    /// Left operand.
    pub left_group: GroupRef,
    /// Right operand.
    pub right_group: GroupRef,
}

/// Group attributes to save.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupToSaveDetails {
    /// Full group name.
    pub name: String,
    /// Display extension.
    pub display_extension: String,
    /// Description.
    pub description: String,
    /// Composite definition, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<CompositeDetail>,
}

/// One group in a save request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupToSave {
    /// Attributes to save.
    pub ws_group: GroupToSaveDetails,
    /// Lookup for an existing group of the same name.
    pub ws_group_lookup: GroupLookup,
}

/// Group save request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSaveRequest {
    /// Groups to save.
    pub ws_group_to_saves: Vec<GroupToSave>,
}

impl GroupSaveRequest {
    /// Save a plain group.
    #[must_use]
    pub fn group(name: &str, display_extension: &str, description: &str) -> Self {
        Self::single(GroupToSaveDetails {
            name: name.to_string(),
            display_extension: display_extension.to_string(),
            description: description.to_string(),
            detail: None,
        })
    }

    /// Save a composite group; the description doubles as display extension.
    #[must_use]
    pub fn composite(
        name: &str,
        description: &str,
        composite_type: CompositeType,
        left_group: &str,
        right_group: &str,
    ) -> Self {
        Self::single(GroupToSaveDetails {
            name: name.to_string(),
            display_extension: description.to_string(),
            description: description.to_string(),
            detail: Some(CompositeDetail {
                composite_type,
                has_composite: FLAG_TRUE.to_string(),
                left_group: GroupRef {
                    name: left_group.to_string(),
                },
                right_group: GroupRef {
                    name: right_group.to_string(),
                },
            }),
        })
    }

    fn single(details: GroupToSaveDetails) -> Self {
        let lookup = GroupLookup {
            group_name: details.name.clone(),
        };
        Self {
            ws_group_to_saves: vec![GroupToSave {
                ws_group: details,
                ws_group_lookup: lookup,
            }],
        }
    }
}

/// Privilege assignment for one privilege.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignPrivilegeRequest {
    /// Always [`FLAG_TRUE`].
    pub allowed: String,
    /// UUID of the subject (the access group) receiving the privilege.
    pub subject_id: String,
    /// Privilege to grant.
    pub privilege_name: Privilege,
    /// Group the privilege applies to.
    pub group_name: String,
    /// Always `access`.
    pub privilege_type: String,
}

impl AssignPrivilegeRequest {
    /// Grant `privilege` on `group_name` to the subject `subject_id`.
    #[must_use]
    pub fn grant(subject_id: &str, group_name: &str, privilege: Privilege) -> Self {
        Self {
            allowed: FLAG_TRUE.to_string(),
            subject_id: subject_id.to_string(),
            privilege_name: privilege,
            group_name: group_name.to_string(),
            privilege_type: "access".to_string(),
        }
    }
}

/// Access privilege on a group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    /// Read membership.
    Read,
    /// See the group.
    View,
    /// Change membership.
    Update,
    /// Full control.
    Admin,
    /// Join the group.
    Optin,
    /// Leave the group.
    Optout,
}

impl Privilege {
    /// Returns the privilege name used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::View => "view",
            Self::Update => "update",
            Self::Admin => "admin",
            Self::Optin => "optin",
            Self::Optout => "optout",
        }
    }

    /// Returns all privileges.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Read,
            Self::View,
            Self::Update,
            Self::Admin,
            Self::Optin,
            Self::Optout,
        ]
    }
}

impl FromStr for Privilege {
    type Err = Error;

    fn from_str(s: &str) -> grouper_core::Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|privilege| privilege.as_str() == s)
            .ok_or_else(|| Error::ValidationError(format!("Invalid privilege name: {s}")))
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Privilege names as given by the caller: one name or an ordered list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeNames(Vec<String>);

impl PrivilegeNames {
    /// Returns the names in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Parses every name, failing on the first unknown one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] naming the first invalid privilege.
    pub fn parse(&self) -> grouper_core::Result<Vec<Privilege>> {
        self.0.iter().map(|name| name.parse()).collect()
    }
}

impl From<&str> for PrivilegeNames {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for PrivilegeNames {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Privilege> for PrivilegeNames {
    fn from(privilege: Privilege) -> Self {
        Self(vec![privilege.as_str().to_string()])
    }
}

impl From<Vec<String>> for PrivilegeNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for PrivilegeNames {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PrivilegeNames {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|name| (*name).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PrivilegeNames {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|name| (*name).to_string()).collect())
    }
}

impl From<Vec<Privilege>> for PrivilegeNames {
    fn from(privileges: Vec<Privilege>) -> Self {
        Self(
            privileges
                .iter()
                .map(|privilege| privilege.as_str().to_string())
                .collect(),
        )
    }
}

/// Set operation behind a composite group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CompositeType {
    /// Members of the left group not in the right group.
    Complement,
    /// Members of both groups.
    Intersection,
    /// Members of either group.
    Union,
}

impl CompositeType {
    /// Returns the composite type name used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complement => "complement",
            Self::Intersection => "intersection",
            Self::Union => "union",
        }
    }
}

impl FromStr for CompositeType {
    type Err = Error;

    fn from_str(s: &str) -> grouper_core::Result<Self> {
        match s {
            "complement" => Ok(Self::Complement),
            "intersection" => Ok(Self::Intersection),
            "union" => Ok(Self::Union),
            _ => Err(Error::ValidationError(format!(
                "Invalid composite_type '{s}'"
            ))),
        }
    }
}

impl fmt::Display for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result metadata present in every response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Primary result code.
    pub result_code: String,
    /// Secondary result code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code2: Option<String>,
    /// Human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    /// `T` or `F`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

/// A typed response envelope, keyed by its Grouper result name.
pub trait WsResult: DeserializeOwned {
    /// Top-level key of the envelope, e.g. `WsGetMembersLiteResult`.
    const KEY: &'static str;

    /// Result metadata of the response.
    fn metadata(&self) -> &ResultMetadata;
}

macro_rules! ws_result {
    ($(#[$meta:meta])* $name:ident, $key:literal { $($(#[$field_meta:meta])* $field:ident: $ty:ty,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            /// Result metadata.
            pub result_metadata: ResultMetadata,
            $($(#[$field_meta])* pub $field: $ty,)*
        }

        impl WsResult for $name {
            const KEY: &'static str = $key;

            fn metadata(&self) -> &ResultMetadata {
                &self.result_metadata
            }
        }
    };
}

ws_result!(
    /// Response to a membership check.
    HasMemberLiteResult, "WsHasMemberLiteResult" {}
);

ws_result!(
    /// Response to a member listing.
    GetMembersLiteResult, "WsGetMembersLiteResult" {
        /// Members; absent when the group is empty.
        #[serde(default)]
        ws_subjects: Vec<Subject>,
    }
);

ws_result!(
    /// Response to a member addition.
    AddMemberLiteResult, "WsAddMemberLiteResult" {}
);

ws_result!(
    /// Response to a member removal.
    DeleteMemberLiteResult, "WsDeleteMemberLiteResult" {}
);

ws_result!(
    /// Response to a group search.
    FindGroupsResults, "WsFindGroupsResults" {
        /// Matching groups; absent when nothing matched.
        #[serde(default)]
        group_results: Vec<Group>,
    }
);

ws_result!(
    /// Response to a stem search.
    FindStemsResults, "WsFindStemsResults" {
        /// Matching stems; absent when nothing matched.
        #[serde(default)]
        stem_results: Vec<Stem>,
    }
);

ws_result!(
    /// Response to a group deletion.
    GroupDeleteResults, "WsGroupDeleteResults" {}
);

ws_result!(
    /// Response to a group save.
    GroupSaveResults, "WsGroupSaveResults" {}
);

ws_result!(
    /// Response to a privilege assignment.
    AssignGrouperPrivilegesLiteResult, "WsAssignGrouperPrivilegesLiteResult" {}
);

/// Subject (usually a person) as returned in member listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Subject identifier within its source.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subject source, e.g. `ldap`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Grouper member UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    /// Per-subject result code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    /// `T` or `F`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    /// Requested subject attribute values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_values: Vec<String>,
}

/// Group as returned by group searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Full group name, e.g. `org:test:staff`.
    pub name: String,
    /// Group UUID.
    pub uuid: String,
    /// Full display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Last name component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Last display name component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_extension: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `group`, `role` or `entity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_group: Option<String>,
    /// Numeric index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_index: Option<String>,
    /// `T` or `F`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
}

impl Group {
    /// Returns false only when the service marks the group disabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.as_deref() != Some("F")
    }
}

/// Stem (folder) as returned by stem searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stem {
    /// Full stem name, e.g. `org:test`.
    pub name: String,
    /// Stem UUID.
    pub uuid: String,
    /// Full display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Last name component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Last display name component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_extension: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Numeric index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_index: Option<String>,
}
