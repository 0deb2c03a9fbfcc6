//! Asynchronous Grouper WS client implementation.

use crate::models::{
    result_codes, AddMemberLiteResult, AssignGrouperPrivilegesLiteResult, AssignPrivilegeRequest,
    CompositeType, DeleteMemberLiteResult, FindGroupsRequest, FindGroupsResults, FindStemsRequest,
    FindStemsResults, GetMembersLiteRequest, GetMembersLiteResult, Group, GroupDeleteRequest,
    GroupDeleteResults, GroupLookup, GroupSaveRequest, GroupSaveResults, HasMemberLiteResult,
    PrivilegeNames, ResultMetadata, Stem, Subject, WsRequest, WsResult,
};
use crate::Result;
use chrono::NaiveDateTime;
use grouper_core::client::{EndpointPath, HttpTransport, Transport};
use grouper_core::config::ClientConfig;
use grouper_core::types::{Scheme, WsVersion};
use grouper_core::Error;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builder for [`GrouperClient`].
#[derive(Debug, Clone)]
pub struct GrouperClientBuilder {
    config: ClientConfig,
}

impl GrouperClientBuilder {
    /// Create a builder for the given host and basic auth credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the host or username is empty.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            config: ClientConfig::new(host, username, password)?,
        })
    }

    /// Override the protocol version (defaults to the oldest supported).
    #[must_use]
    pub fn with_version(mut self, version: WsVersion) -> Self {
        self.config = self.config.with_version(version);
        self
    }

    /// Override the protocol version by tag, e.g. `v2_5_000`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the tag is not a supported version.
    pub fn with_version_tag(mut self, tag: &str) -> Result<Self> {
        self.config = self.config.with_version_tag(tag)?;
        Ok(self)
    }

    /// Override the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config = self.config.with_timeout(seconds);
        self
    }

    /// Override the URI scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.config = self.config.with_scheme(scheme);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the configuration is invalid.
    pub fn build(self) -> Result<GrouperClient> {
        GrouperClient::from_config(&self.config)
    }
}

/// Asynchronous Grouper WS client.
///
/// Cloning is cheap; clones share the underlying transport.
#[derive(Clone)]
pub struct GrouperClient {
    transport: Arc<dyn Transport>,
}

impl GrouperClient {
    /// Start a builder for the given host and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the host or username is empty.
    pub fn builder(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<GrouperClientBuilder> {
        GrouperClientBuilder::new(host, username, password)
    }

    /// Construct a client over HTTP from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the configuration is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Construct a client over an existing transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Check whether `user` is a member of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] if Grouper does not know the subject or
    /// answers with any code other than `IS_MEMBER` / `IS_NOT_MEMBER`.
    pub async fn is_member(&self, user: &str, group: &str) -> Result<bool> {
        const OPERATION: &str = "is_member";
        debug!(user, group, "Checking Grouper membership");

        let result: HasMemberLiteResult = self
            .call(OPERATION, Method::GET, member_path(group, user), None)
            .await?;
        let metadata = result.metadata();

        match metadata.result_code.as_str() {
            result_codes::IS_MEMBER => Ok(true),
            _ if metadata.result_code2.as_deref() == Some(result_codes::SUBJECT_NOT_FOUND) => {
                warn!(user, group, "Subject not found in Grouper");
                Err(Error::ServiceError {
                    status: None,
                    result_code: Some(result_codes::SUBJECT_NOT_FOUND.to_string()),
                    message: format!(
                        "{OPERATION} - SUBJECT_NOT_FOUND error, is this user in Grouper?"
                    ),
                })
            }
            result_codes::IS_NOT_MEMBER => Ok(false),
            _ => Err(unexpected(OPERATION, metadata)),
        }
    }

    /// List the members of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn get_members(&self, group: &str) -> Result<Vec<Subject>> {
        const OPERATION: &str = "get_members";
        debug!(group, "Listing Grouper members");

        let result: GetMembersLiteResult = self
            .call(OPERATION, Method::GET, members_path(group), None)
            .await?;
        expect_code(OPERATION, result.metadata(), &[result_codes::SUCCESS])?;
        Ok(result.ws_subjects)
    }

    /// List the members of `group` at a point in time, or over a range when
    /// `to` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn get_members_pit(
        &self,
        group: &str,
        from: &NaiveDateTime,
        to: Option<&NaiveDateTime>,
    ) -> Result<Vec<Subject>> {
        const OPERATION: &str = "get_members_pit";
        let request = GetMembersLiteRequest::between(from, to);
        debug!(
            group,
            from = %request.point_in_time_from,
            to = %request.point_in_time_to,
            "Listing Grouper members at point in time"
        );

        let body = to_body(OPERATION, &WsRequest::GetMembersLite(request))?;
        let result: GetMembersLiteResult = self
            .call(OPERATION, Method::POST, members_path(group), Some(body))
            .await?;
        expect_code(OPERATION, result.metadata(), &[result_codes::SUCCESS])?;
        Ok(result.ws_subjects)
    }

    /// Add `user` to `group`, optionally passing extra request fields
    /// (e.g. `{"disabledTime": "..."}`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn add_member(&self, user: &str, group: &str, data: Option<&Value>) -> Result<()> {
        const OPERATION: &str = "add_member";
        debug!(user, group, "Adding Grouper member");

        let body = data.cloned().unwrap_or_else(|| json!({}));
        let result: AddMemberLiteResult = self
            .call(OPERATION, Method::PUT, member_path(group, user), Some(body))
            .await?;
        expect_code(OPERATION, result.metadata(), &[result_codes::SUCCESS])
    }

    /// Remove `user` from `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn delete_member(&self, user: &str, group: &str) -> Result<()> {
        const OPERATION: &str = "delete_member";
        debug!(user, group, "Removing Grouper member");

        let result: DeleteMemberLiteResult = self
            .call(OPERATION, Method::DELETE, member_path(group, user), None)
            .await?;
        expect_code(OPERATION, result.metadata(), &[result_codes::SUCCESS])
    }

    /// List the groups directly below `stem`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn find_groups_by_stem(&self, stem: &str) -> Result<Vec<Group>> {
        debug!(stem, "Finding Grouper groups by stem");
        self.find_groups("find_groups_by_stem", FindGroupsRequest::by_stem(stem))
            .await
    }

    /// Find groups by name, either exactly or by substring.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn find_groups_by_name(&self, name: &str, exact: bool) -> Result<Vec<Group>> {
        debug!(name, exact, "Finding Grouper groups by name");
        self.find_groups("find_groups_by_name", FindGroupsRequest::by_name(name, exact))
            .await
    }

    /// Find stems whose name approximately matches `stem`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn find_stems_for_stem(&self, stem: &str) -> Result<Vec<Stem>> {
        const OPERATION: &str = "find_stems_for_stem";
        debug!(stem, "Finding Grouper stems");

        let body = to_body(OPERATION, &WsRequest::FindStems(FindStemsRequest::by_stem(stem)))?;
        let result: FindStemsResults = self
            .call(OPERATION, Method::POST, EndpointPath::new("stems"), Some(body))
            .await?;
        expect_code(OPERATION, result.metadata(), &[result_codes::SUCCESS])?;
        Ok(result.stem_results)
    }

    /// Delete the named groups in one request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without contacting the service when
    /// no names are given, and [`Error::ServiceError`] unless Grouper answers
    /// `SUCCESS`.
    pub async fn delete_groups<I, S>(&self, group_names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        const OPERATION: &str = "delete_groups";
        let lookups: Vec<GroupLookup> = group_names
            .into_iter()
            .map(|name| GroupLookup {
                group_name: name.into(),
            })
            .collect();

        if lookups.is_empty() {
            return Err(Error::ValidationError(format!(
                "{OPERATION} - No group names provided"
            )));
        }
        debug!(count = lookups.len(), "Deleting Grouper groups");

        let body = to_body(OPERATION, &WsRequest::GroupDelete(GroupDeleteRequest {
            ws_group_lookups: lookups,
        }))?;
        let result: GroupDeleteResults = self
            .call(OPERATION, Method::POST, EndpointPath::new("groups"), Some(body))
            .await?;
        expect_code(OPERATION, result.metadata(), &[result_codes::SUCCESS])
    }

    /// Create (or update) a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] unless Grouper answers `SUCCESS`.
    pub async fn create_group(
        &self,
        name: &str,
        display_extension: &str,
        description: &str,
    ) -> Result<()> {
        const OPERATION: &str = "create_group";
        debug!(name, "Creating Grouper group");

        let request = GroupSaveRequest::group(name, display_extension, description);
        self.save_group(OPERATION, request).await
    }

    /// Create a composite group `new_name` whose membership is `composite_type`
    /// (`complement`, `intersection` or `union`) of the two operand groups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] without contacting the service for an
    /// unknown composite type, and [`Error::ServiceError`] unless Grouper
    /// answers `SUCCESS`.
    pub async fn create_composite_group(
        &self,
        left_group: &str,
        right_group: &str,
        composite_type: &str,
        description: &str,
        new_name: &str,
    ) -> Result<()> {
        const OPERATION: &str = "create_composite_group";
        let composite_type: CompositeType = composite_type
            .parse()
            .map_err(|err| with_operation(OPERATION, err))?;
        debug!(new_name, left_group, right_group, %composite_type, "Creating Grouper composite group");

        let request = GroupSaveRequest::composite(
            new_name,
            description,
            composite_type,
            left_group,
            right_group,
        );
        self.save_group(OPERATION, request).await
    }

    /// Grant `privileges` on `target_group` to the members of `access_group`.
    ///
    /// One request is issued per privilege, in order. A failure stops the
    /// remaining grants; grants already issued stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for an unknown privilege name (before
    /// any request) or when `access_group` does not exist, and
    /// [`Error::ServiceError`] on the first grant that is neither
    /// `SUCCESS_ALLOWED` nor `SUCCESS_ALLOWED_ALREADY_EXISTED`.
    pub async fn add_privilege(
        &self,
        access_group: &str,
        target_group: &str,
        privileges: impl Into<PrivilegeNames>,
    ) -> Result<()> {
        const OPERATION: &str = "add_privilege";
        let privileges = privileges
            .into()
            .parse()
            .map_err(|err| with_operation(OPERATION, err))?;

        let access = self
            .find_groups(OPERATION, FindGroupsRequest::by_name(access_group, true))
            .await?
            .pop()
            .ok_or_else(|| {
                Error::ValidationError(format!(
                    "{OPERATION} - Couldn't find access group: {access_group}"
                ))
            })?;

        for privilege in privileges {
            debug!(access_group, target_group, %privilege, "Granting Grouper privilege");
            let body = to_body(OPERATION, &WsRequest::AssignGrouperPrivilegesLite(
                AssignPrivilegeRequest::grant(&access.uuid, target_group, privilege),
            ))?;
            let result: AssignGrouperPrivilegesLiteResult = self
                .call(
                    OPERATION,
                    Method::POST,
                    EndpointPath::new("grouperPrivileges"),
                    Some(body),
                )
                .await?;
            expect_code(
                OPERATION,
                result.metadata(),
                &[
                    result_codes::SUCCESS_ALLOWED,
                    result_codes::SUCCESS_ALLOWED_ALREADY_EXISTED,
                ],
            )?;
        }

        Ok(())
    }

    async fn find_groups(
        &self,
        operation: &'static str,
        request: FindGroupsRequest,
    ) -> Result<Vec<Group>> {
        let body = to_body(operation, &WsRequest::FindGroups(request))?;
        let result: FindGroupsResults = self
            .call(operation, Method::POST, EndpointPath::new("groups"), Some(body))
            .await?;
        expect_code(operation, result.metadata(), &[result_codes::SUCCESS])?;
        Ok(result.group_results)
    }

    async fn save_group(&self, operation: &'static str, request: GroupSaveRequest) -> Result<()> {
        let body = to_body(operation, &WsRequest::GroupSave(request))?;
        let result: GroupSaveResults = self
            .call(operation, Method::POST, EndpointPath::new("groups"), Some(body))
            .await?;
        expect_code(operation, result.metadata(), &[result_codes::SUCCESS])
    }

    async fn call<R>(
        &self,
        operation: &'static str,
        method: Method,
        endpoint: EndpointPath,
        body: Option<Value>,
    ) -> Result<R>
    where
        R: WsResult,
    {
        let response = self
            .transport
            .request(method, &endpoint, body)
            .await
            .map_err(|err| with_operation(operation, err))?;
        decode_result(operation, response)
    }
}

fn members_path(group: &str) -> EndpointPath {
    EndpointPath::new("groups").segment(group).segment("members")
}

fn member_path(group: &str, user: &str) -> EndpointPath {
    members_path(group).segment(user)
}

fn to_body(operation: &str, request: &WsRequest) -> Result<Value> {
    serde_json::to_value(request).map_err(|err| {
        Error::ValidationError(format!("{operation} - Unserializable request: {err}"))
    })
}

fn decode_result<R: WsResult>(operation: &str, mut response: Value) -> Result<R> {
    let envelope = response
        .get_mut(R::KEY)
        .map(Value::take)
        .ok_or_else(|| {
            Error::DecodeError(format!("{operation} - response is missing `{}`", R::KEY))
        })?;

    serde_json::from_value(envelope).map_err(|err| {
        Error::DecodeError(format!("{operation} - malformed `{}`: {err}", R::KEY))
    })
}

fn expect_code(operation: &str, metadata: &ResultMetadata, accepted: &[&str]) -> Result<()> {
    if accepted.contains(&metadata.result_code.as_str()) {
        Ok(())
    } else {
        Err(unexpected(operation, metadata))
    }
}

fn unexpected(operation: &str, metadata: &ResultMetadata) -> Error {
    warn!(
        operation,
        result_code = %metadata.result_code,
        result_message = ?metadata.result_message,
        "Unexpected Grouper result"
    );
    Error::unexpected_result(operation, metadata.result_code.clone())
}

fn with_operation(operation: &str, err: Error) -> Error {
    let prefixed = |message: String| format!("{operation} - {message}");
    match err {
        Error::ValidationError(message) => Error::ValidationError(prefixed(message)),
        Error::TransportError(message) => Error::TransportError(prefixed(message)),
        Error::DecodeError(message) => Error::DecodeError(prefixed(message)),
        Error::ServiceError {
            status,
            result_code,
            message,
        } => Error::ServiceError {
            status,
            result_code,
            message: prefixed(message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::{mock, Sequence};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROOT: &str = "/grouper-ws/servicesRest/json/v2_2_000";

    mock! {
        WsTransport {}

        #[async_trait]
        impl Transport for WsTransport {
            async fn request(
                &self,
                method: Method,
                endpoint: &EndpointPath,
                body: Option<Value>,
            ) -> Result<Value>;
        }
    }

    fn test_client(server: &MockServer) -> GrouperClient {
        GrouperClient::builder(server.address().to_string(), "svc-grouper", "s3cret")
            .unwrap()
            .with_scheme(Scheme::Http)
            .build()
            .unwrap()
    }

    fn mocked(transport: MockWsTransport) -> GrouperClient {
        GrouperClient::with_transport(Arc::new(transport))
    }

    fn metadata(code: &str) -> Value {
        json!({"resultCode": code})
    }

    async fn respond(server: &MockServer, verb: &str, endpoint: &str, body: Value) {
        Mock::given(method(verb))
            .and(path(format!("{ROOT}/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn expect_no_requests(server: &MockServer) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    #[test]
    fn builder_rejects_unknown_version_tag() {
        let err = GrouperClient::builder("grouper.example.edu", "u", "p")
            .unwrap()
            .with_version_tag("v3_0_000")
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn builder_accepts_every_supported_version() {
        for version in WsVersion::all() {
            GrouperClient::builder("grouper.example.edu", "u", "p")
                .unwrap()
                .with_version_tag(version.as_str())
                .unwrap()
                .build()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn is_member_true() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members/jdoe",
            json!({"WsHasMemberLiteResult": {"resultMetadata": metadata("IS_MEMBER")}}),
        )
        .await;

        let client = test_client(&server);
        assert!(client.is_member("jdoe", "org:test:staff").await.unwrap());
    }

    #[tokio::test]
    async fn is_member_false() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members/jdoe",
            json!({"WsHasMemberLiteResult": {"resultMetadata": metadata("IS_NOT_MEMBER")}}),
        )
        .await;

        let client = test_client(&server);
        assert!(!client.is_member("jdoe", "org:test:staff").await.unwrap());
    }

    #[tokio::test]
    async fn is_member_subject_not_found() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members/ghost",
            json!({"WsHasMemberLiteResult": {"resultMetadata": {
                "resultCode": "IS_NOT_MEMBER",
                "resultCode2": "SUBJECT_NOT_FOUND"
            }}}),
        )
        .await;

        let client = test_client(&server);
        let err = client.is_member("ghost", "org:test:staff").await.unwrap_err();
        assert!(matches!(err, Error::ServiceError { .. }));
        assert!(err.to_string().contains("SUBJECT_NOT_FOUND"));
        assert_eq!(err.result_code(), Some("SUBJECT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn is_member_unexpected_code() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members/jdoe",
            json!({"WsHasMemberLiteResult": {"resultMetadata": metadata("GROUP_NOT_FOUND")}}),
        )
        .await;

        let client = test_client(&server);
        let err = client.is_member("jdoe", "org:test:staff").await.unwrap_err();
        assert_eq!(err, Error::unexpected_result("is_member", "GROUP_NOT_FOUND"));
    }

    #[tokio::test]
    async fn get_members_without_subjects_is_empty() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members",
            json!({"WsGetMembersLiteResult": {"resultMetadata": metadata("SUCCESS")}}),
        )
        .await;

        let client = test_client(&server);
        assert!(client.get_members("org:test:staff").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_members_returns_subjects() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members",
            json!({"WsGetMembersLiteResult": {
                "resultMetadata": metadata("SUCCESS"),
                "wsSubjects": [
                    {"id": "jdoe", "sourceId": "ldap", "success": "T", "resultCode": "SUCCESS"},
                    {"id": "asmith", "sourceId": "ldap"}
                ]
            }}),
        )
        .await;

        let client = test_client(&server);
        let members = client.get_members("org:test:staff").await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id, "jdoe");
        assert_eq!(members[1].source_id.as_deref(), Some("ldap"));
    }

    #[tokio::test]
    async fn get_members_failure_code() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members",
            json!({"WsGetMembersLiteResult": {"resultMetadata": metadata("GROUP_NOT_FOUND")}}),
        )
        .await;

        let client = test_client(&server);
        let err = client.get_members("org:test:staff").await.unwrap_err();
        assert_eq!(err.result_code(), Some("GROUP_NOT_FOUND"));
        assert!(err.to_string().contains("get_members"));
    }

    #[tokio::test]
    async fn get_members_missing_envelope_is_decode_error() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "groups/org:test:staff/members",
            json!({"WsRestResultProblem": {}}),
        )
        .await;

        let client = test_client(&server);
        let err = client.get_members("org:test:staff").await.unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[tokio::test]
    async fn get_members_pit_posts_range() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{ROOT}/groups/org:test:staff/members")))
            .and(body_json(json!({
                "WsRestGetMembersLiteRequest": {
                    "pointInTimeFrom": "2023/01/01 00:00:00.000",
                    "pointInTimeTo": "2023/01/01 00:00:00.000"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsGetMembersLiteResult": {
                    "resultMetadata": metadata("SUCCESS"),
                    "wsSubjects": [{"id": "jdoe"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let from = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let client = test_client(&server);
        let members = client
            .get_members_pit("org:test:staff", &from, None)
            .await
            .unwrap();
        assert_eq!(members[0].id, "jdoe");
    }

    #[tokio::test]
    async fn add_member_sends_empty_body_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("{ROOT}/groups/org:test:staff/members/jdoe")))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "WsAddMemberLiteResult": {"resultMetadata": metadata("SUCCESS")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.add_member("jdoe", "org:test:staff", None).await.unwrap();
    }

    #[tokio::test]
    async fn add_member_forwards_data() {
        let server = MockServer::start().await;
        let data = json!({"WsRestAddMemberLiteRequest": {"disabledTime": "2030/01/01 00:00:00.000"}});
        Mock::given(method("PUT"))
            .and(path(format!("{ROOT}/groups/org:test:staff/members/jdoe")))
            .and(body_json(data.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsAddMemberLiteResult": {"resultMetadata": metadata("SUCCESS")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .add_member("jdoe", "org:test:staff", Some(&data))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_member_failure_code() {
        let server = MockServer::start().await;
        respond(
            &server,
            "DELETE",
            "groups/org:test:staff/members/jdoe",
            json!({"WsDeleteMemberLiteResult": {"resultMetadata": metadata("PROBLEM_DELETING_MEMBERS")}}),
        )
        .await;

        let client = test_client(&server);
        let err = client.delete_member("jdoe", "org:test:staff").await.unwrap_err();
        assert_eq!(err.result_code(), Some("PROBLEM_DELETING_MEMBERS"));
    }

    #[tokio::test]
    async fn find_groups_by_stem_returns_groups() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{ROOT}/groups")))
            .and(body_json(json!({
                "WsRestFindGroupsRequest": {"wsQueryFilter": {
                    "queryFilterType": "FIND_BY_STEM_NAME",
                    "stemName": "org:test"
                }}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsFindGroupsResults": {
                    "resultMetadata": metadata("SUCCESS"),
                    "groupResults": [{"name": "org:test:staff", "uuid": "a1"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let groups = client.find_groups_by_stem("org:test").await.unwrap();
        assert_eq!(groups[0].name, "org:test:staff");
    }

    #[tokio::test]
    async fn find_groups_by_name_without_results_is_empty() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "groups",
            json!({"WsFindGroupsResults": {"resultMetadata": metadata("SUCCESS")}}),
        )
        .await;

        let client = test_client(&server);
        assert!(client
            .find_groups_by_name("nothing", false)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn find_stems_for_stem_returns_stems() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "stems",
            json!({"WsFindStemsResults": {
                "resultMetadata": metadata("SUCCESS"),
                "stemResults": [{"name": "org:test", "uuid": "s1"}, {"name": "org:test2", "uuid": "s2"}]
            }}),
        )
        .await;

        let client = test_client(&server);
        let stems = client.find_stems_for_stem("org:test").await.unwrap();
        assert_eq!(stems.len(), 2);
        assert_eq!(stems[1].uuid, "s2");
    }

    #[tokio::test]
    async fn delete_groups_empty_is_rejected_without_request() {
        let server = MockServer::start().await;
        expect_no_requests(&server).await;

        let client = test_client(&server);
        let err = client.delete_groups(Vec::<String>::new()).await.unwrap_err();
        assert_eq!(
            err,
            Error::ValidationError("delete_groups - No group names provided".to_string())
        );
    }

    #[tokio::test]
    async fn delete_groups_sends_lookups() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{ROOT}/groups")))
            .and(body_json(json!({
                "WsRestGroupDeleteRequest": {"wsGroupLookups": [
                    {"groupName": "org:test:a"},
                    {"groupName": "org:test:b"}
                ]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WsGroupDeleteResults": {"resultMetadata": metadata("SUCCESS")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .delete_groups(["org:test:a", "org:test:b"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_group_sends_save_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{ROOT}/groups")))
            .and(body_json(json!({
                "WsRestGroupSaveRequest": {"wsGroupToSaves": [{
                    "wsGroup": {
                        "name": "org:test:new",
                        "displayExtension": "New Group",
                        "description": "A new group"
                    },
                    "wsGroupLookup": {"groupName": "org:test:new"}
                }]}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "WsGroupSaveResults": {"resultMetadata": metadata("SUCCESS")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .create_group("org:test:new", "New Group", "A new group")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_group_failure_code() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "groups",
            json!({"WsGroupSaveResults": {"resultMetadata": metadata("PROBLEM_SAVING_GROUPS")}}),
        )
        .await;

        let client = test_client(&server);
        let err = client
            .create_group("org:test:new", "New Group", "A new group")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Service error: create_group - Unexpected result received: PROBLEM_SAVING_GROUPS"
        );
    }

    #[tokio::test]
    async fn create_composite_group_invalid_type_without_request() {
        let server = MockServer::start().await;
        expect_no_requests(&server).await;

        let client = test_client(&server);
        let err = client
            .create_composite_group("org:a", "org:b", "invalid", "desc", "org:c")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::ValidationError(
                "create_composite_group - Invalid composite_type 'invalid'".to_string()
            )
        );
    }

    #[tokio::test]
    async fn create_composite_group_success() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "groups",
            json!({"WsGroupSaveResults": {"resultMetadata": metadata("SUCCESS")}}),
        )
        .await;

        let client = test_client(&server);
        client
            .create_composite_group("org:a", "org:b", "complement", "A minus B", "org:c")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_privilege_invalid_name_without_request() {
        let mut transport = MockWsTransport::new();
        transport.expect_request().never();

        let err = mocked(transport)
            .add_privilege("org:admins", "org:test:staff", vec!["read", "bogus"])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::ValidationError("add_privilege - Invalid privilege name: bogus".to_string())
        );
    }

    #[tokio::test]
    async fn add_privilege_missing_access_group() {
        let mut transport = MockWsTransport::new();
        transport
            .expect_request()
            .withf(|method, endpoint, _| *method == Method::POST && endpoint.to_string() == "groups")
            .times(1)
            .returning(|_, _, _| {
                Ok(json!({"WsFindGroupsResults": {"resultMetadata": {"resultCode": "SUCCESS"}}}))
            });

        let err = mocked(transport)
            .add_privilege("org:nobody", "org:test:staff", "read")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::ValidationError(
                "add_privilege - Couldn't find access group: org:nobody".to_string()
            )
        );
    }

    #[tokio::test]
    async fn add_privilege_grants_each_privilege_in_order() {
        let mut transport = MockWsTransport::new();
        let mut seq = Sequence::new();

        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, endpoint, body| {
                endpoint.to_string() == "groups"
                    && body.as_ref().map(|b| {
                        b["WsRestFindGroupsRequest"]["wsQueryFilter"]["queryFilterType"]
                            == "FIND_BY_GROUP_NAME_EXACT"
                    }) == Some(true)
            })
            .returning(|_, _, _| {
                Ok(json!({"WsFindGroupsResults": {
                    "resultMetadata": {"resultCode": "SUCCESS"},
                    "groupResults": [{"name": "org:admins", "uuid": "adm-uuid"}]
                }}))
            });

        for (privilege, code) in [
            ("read", "SUCCESS_ALLOWED"),
            ("update", "SUCCESS_ALLOWED_ALREADY_EXISTED"),
        ] {
            transport
                .expect_request()
                .times(1)
                .in_sequence(&mut seq)
                .withf(move |method, endpoint, body| {
                    let grant = &body.as_ref().unwrap()["WsRestAssignGrouperPrivilegesLiteRequest"];
                    *method == Method::POST
                        && endpoint.to_string() == "grouperPrivileges"
                        && grant["privilegeName"] == privilege
                        && grant["subjectId"] == "adm-uuid"
                        && grant["groupName"] == "org:test:staff"
                })
                .returning(move |_, _, _| {
                    Ok(json!({"WsAssignGrouperPrivilegesLiteResult": {
                        "resultMetadata": {"resultCode": code}
                    }}))
                });
        }

        mocked(transport)
            .add_privilege("org:admins", "org:test:staff", ["read", "update"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_privilege_stops_after_first_failure() {
        let mut transport = MockWsTransport::new();
        let mut seq = Sequence::new();

        transport
            .expect_request()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, endpoint, _| endpoint.to_string() == "groups")
            .returning(|_, _, _| {
                Ok(json!({"WsFindGroupsResults": {
                    "resultMetadata": {"resultCode": "SUCCESS"},
                    "groupResults": [{"name": "org:admins", "uuid": "adm-uuid"}]
                }}))
            });
        for code in ["SUCCESS_ALLOWED", "INSUFFICIENT_PRIVILEGES"] {
            transport
                .expect_request()
                .times(1)
                .in_sequence(&mut seq)
                .withf(|_, endpoint, _| endpoint.to_string() == "grouperPrivileges")
                .returning(move |_, _, _| {
                    Ok(json!({"WsAssignGrouperPrivilegesLiteResult": {
                        "resultMetadata": {"resultCode": code}
                    }}))
                });
        }

        let err = mocked(transport)
            .add_privilege("org:admins", "org:test:staff", ["admin", "view", "read"])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::unexpected_result("add_privilege", "INSUFFICIENT_PRIVILEGES")
        );
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mut transport = MockWsTransport::new();
        transport
            .expect_request()
            .returning(|_, _, _| Err(Error::TransportError("connection reset".to_string())));

        let err = mocked(transport)
            .get_members("org:test:staff")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::TransportError("get_members - connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn http_status_errors_name_the_operation() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{ROOT}/groups/org:test:staff/members/jdoe")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.delete_member("jdoe", "org:test:staff").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.result_code(), None);
        assert!(err.to_string().starts_with("Service error: delete_member - "), "{err}");
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn decode_errors_name_the_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{ROOT}/groups/org:test:staff/members")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html/>"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get_members("org:test:staff").await.unwrap_err();
        match err {
            Error::DecodeError(message) => assert!(message.starts_with("get_members - "), "{message}"),
            other => panic!("Expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_errors_name_the_operation() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = GrouperClient::builder(addr.to_string(), "svc-grouper", "s3cret")
            .unwrap()
            .with_scheme(Scheme::Http)
            .with_timeout(5)
            .build()
            .unwrap();

        let err = client.is_member("jdoe", "org:test:staff").await.unwrap_err();
        match err {
            Error::TransportError(message) => assert!(message.starts_with("is_member - "), "{message}"),
            other => panic!("Expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_privilege_lookup_failure_names_add_privilege() {
        let mut transport = MockWsTransport::new();
        transport
            .expect_request()
            .times(1)
            .returning(|_, _, _| {
                Ok(json!({"WsFindGroupsResults": {"resultMetadata": {"resultCode": "GROUP_NOT_FOUND"}}}))
            });

        let err = mocked(transport)
            .add_privilege("org:admins", "org:test:staff", "read")
            .await
            .unwrap_err();
        assert_eq!(err, Error::unexpected_result("add_privilege", "GROUP_NOT_FOUND"));
    }
}
