use serde_json::Value;

/// Error body for a GET whose path does not resolve.
pub const NOT_FOUND_BODY: &str = "{ \"error\": \"Requested value doesn't exist\" }";
/// Error body for a PUT whose body is not well-formed JSON.
pub const INVALID_JSON_BODY: &str = "{ \"error\": \"Invalid JSON\" }";
/// Error body for any method other than GET and PUT.
pub const INVALID_METHOD_BODY: &str = "{ \"error\": \"Invalid method\" }";
/// Body for a committed PUT.
pub const UPDATED_BODY: &str = "{ \"success\": \"Configuration updated\" }";

/// HTTP status codes the controller answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use controller::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
        }
    }

    /// The status line without the protocol prefix, e.g. `"200 OK"`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Where a response body comes from.
#[derive(Debug, Clone, Copy)]
pub enum BodySource<'a> {
    /// A subtree of the configuration document, borrowed for the duration of
    /// one processing step.
    Value(&'a Value),
    /// A JSON literal owned by the controller.
    Literal(&'a str),
}

/// A response waiting to be serialized.
#[derive(Debug, Clone, Copy)]
pub struct Response<'a> {
    pub status: StatusCode,
    pub body: BodySource<'a>,
}

impl<'a> Response<'a> {
    pub fn new(status: StatusCode, body: BodySource<'a>) -> Self {
        Self { status, body }
    }

    /// 200 OK carrying a configuration subtree.
    pub fn ok(value: &'a Value) -> Self {
        Self::new(StatusCode::Ok, BodySource::Value(value))
    }

    pub fn created() -> Self {
        Self::new(StatusCode::Created, BodySource::Literal(UPDATED_BODY))
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound, BodySource::Literal(NOT_FOUND_BODY))
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest, BodySource::Literal(INVALID_JSON_BODY))
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::MethodNotAllowed,
            BodySource::Literal(INVALID_METHOD_BODY),
        )
    }
}
