// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Ready-made [`Step`]s exercising an in-process HTTP [`Handler`].
//!
//! [`build()`] registers the following [`Step`]s:
//! - `I make a <METHOD> request to "<uri>"`
//! - `I have a <METHOD> request "<uri>"`
//! - `I set request header "<name>" to "<value>"`
//! - `the request has body "<body>"`
//! - `I make the request`
//! - `the response code equals <code>`
//! - `the response contains a valid JSON`
//! - `the response is "<body>"`
//! - `the response header "<name>" equals "<value>"`
//!
//! where `<METHOD>` is one of `GET`, `POST`, `PUT`, `DELETE` or `OPTIONS`.
//! The pending [`Request`] is kept in the [`Context`] under [`RequestKey`],
//! and the last [`Response`] under [`ResponseKey`].
//!
//! [`Step`]: gherkin::Step

use std::{fmt, sync::Arc};

use derive_more::{Display, Error};
use http::{
    header::{HeaderName, HeaderValue},
    HeaderMap, Method, StatusCode,
};

use crate::{
    step::{IntoStepResult, RegistrationError, StepArgs},
    Context, Registry, StepTest, Suite,
};

/// Serves HTTP requests without any network in between.
pub trait Handler: Send + Sync {
    /// Produces the response to the `request`.
    fn serve(&self, request: http::Request<Vec<u8>>) -> http::Response<Vec<u8>>;
}

impl<F> Handler for F
where
    F: Fn(http::Request<Vec<u8>>) -> http::Response<Vec<u8>> + Send + Sync,
{
    fn serve(&self, request: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        self(request)
    }
}

/// Something [`Step`] functions can be registered into.
///
/// [`Step`]: gherkin::Step
pub trait AddStep {
    /// Registers the `step_fn` under the `pattern`.
    ///
    /// # Errors
    ///
    /// If the `pattern` or the `step_fn` signature is rejected.
    fn add_step<A, F, O>(
        &mut self,
        pattern: &str,
        step_fn: F,
    ) -> Result<(), RegistrationError>
    where
        A: StepArgs,
        F: Fn(&mut StepTest, &mut Context, A) -> O + Send + Sync + 'static,
        O: IntoStepResult;
}

impl AddStep for Registry {
    fn add_step<A, F, O>(
        &mut self,
        pattern: &str,
        step_fn: F,
    ) -> Result<(), RegistrationError>
    where
        A: StepArgs,
        F: Fn(&mut StepTest, &mut Context, A) -> O + Send + Sync + 'static,
        O: IntoStepResult,
    {
        Self::add_step(self, pattern, step_fn)
    }
}

impl AddStep for Suite {
    fn add_step<A, F, O>(
        &mut self,
        pattern: &str,
        step_fn: F,
    ) -> Result<(), RegistrationError>
    where
        A: StepArgs,
        F: Fn(&mut StepTest, &mut Context, A) -> O + Send + Sync + 'static,
        O: IntoStepResult,
    {
        Self::add_step(self, pattern, step_fn)
    }
}

/// [`Context`] key of the pending [`Request`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RequestKey;

/// [`Context`] key of the last received [`Response`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResponseKey;

/// Request to be sent to a [`Handler`].
#[derive(Clone, Debug)]
pub struct Request {
    /// HTTP method.
    pub method: Method,

    /// Target URI.
    pub uri: String,

    /// Headers to send.
    pub headers: HeaderMap,

    /// Body to send.
    pub body: Vec<u8>,
}

impl Request {
    /// Creates a new [`Request`] with no headers and an empty body.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMethod`] if the `method` isn't a valid HTTP method
    /// token.
    pub fn new(method: &str, uri: impl Into<String>) -> Result<Self, Error> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
            Error::InvalidMethod {
                method: method.to_owned(),
            }
        })?;
        Ok(Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        })
    }

    /// Appends the header, keeping the previous values of the same `name`.
    ///
    /// # Errors
    ///
    /// If the `name` or the `value` isn't a valid header.
    pub fn append_header(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<(), http::Error> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        _ = self.headers.append(name, value);
        Ok(())
    }
}

/// Response produced by a [`Handler`].
#[derive(Clone, Debug)]
pub struct Response {
    /// Status code.
    pub code: StatusCode,

    /// Received headers.
    pub headers: HeaderMap,

    /// Received body.
    pub body: Vec<u8>,
}

impl Response {
    /// Value of the `name`d header, or an empty string if there is none.
    #[must_use]
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl From<http::Response<Vec<u8>>> for Response {
    fn from(response: http::Response<Vec<u8>>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            code: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// Client sending [`Request`]s straight into a [`Handler`].
#[derive(Clone)]
pub struct TestHttp {
    handler: Arc<dyn Handler>,
}

impl fmt::Debug for TestHttp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHttp").finish_non_exhaustive()
    }
}

macro_rules! method_shortcuts {
    ($($name:ident => $method:ident),* $(,)?) => {$(
        #[doc = concat!(
            "Sends a `", stringify!($method), "` request to the `uri`.\n\n",
            "# Errors\n\n",
            "If the `uri` is malformed.",
        )]
        pub fn $name(
            &self,
            uri: &str,
            body: impl Into<Vec<u8>>,
        ) -> Result<Response, Error> {
            self.send(&Request {
                method: Method::$method,
                uri: uri.to_owned(),
                headers: HeaderMap::new(),
                body: body.into(),
            })
        }
    )*};
}

impl TestHttp {
    /// Creates a new [`TestHttp`] client of the `handler`.
    #[must_use]
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    method_shortcuts! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
        trace => TRACE,
        connect => CONNECT,
    }

    /// Sends a request with the given `method` to the `uri`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMethod`] if the `method` isn't a valid HTTP method
    ///   token.
    /// - [`Error::Request`] if the `uri` is malformed.
    pub fn request(
        &self,
        method: &str,
        uri: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<Response, Error> {
        let mut request = Request::new(method, uri)?;
        request.body = body.into();
        self.send(&request)
    }

    /// Sends the `request` to the [`Handler`].
    ///
    /// # Errors
    ///
    /// [`Error::Request`] if the `uri` is malformed.
    pub fn send(&self, request: &Request) -> Result<Response, Error> {
        let mut req = http::Request::builder()
            .method(request.method.clone())
            .uri(request.uri.as_str())
            .body(request.body.clone())
            .map_err(|source| Error::Request { source })?;
        *req.headers_mut() = request.headers.clone();

        tracing::debug!(
            method = %request.method,
            uri = %request.uri,
            "sending request",
        );
        let response = Response::from(self.handler.serve(req));
        tracing::debug!(code = %response.code, "received response");

        Ok(response)
    }
}

/// Error of sending a [`Request`].
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Method is not a valid HTTP method token.
    #[display(fmt = "invalid HTTP method `{}`", method)]
    InvalidMethod {
        /// Rejected method.
        method: String,
    },

    /// Request cannot be built.
    #[display(fmt = "invalid request: {}", source)]
    Request {
        /// Reason.
        source: http::Error,
    },
}

/// Registers the HTTP [`Step`]s into `steps`, sending requests to the
/// `handler`.
///
/// # Errors
///
/// If any of the [`Step`]s is rejected by `steps`.
///
/// [`Step`]: gherkin::Step
pub fn build<S, H>(
    steps: &mut S,
    handler: H,
) -> Result<TestHttp, RegistrationError>
where
    S: AddStep + ?Sized,
    H: Handler + 'static,
{
    let client = TestHttp::new(handler);

    let http = client.clone();
    steps.add_step(
        r#"^I make a (GET|POST|PUT|DELETE|OPTIONS) request to "([^"]*)"$"#,
        move |_, ctx, (method, uri): (String, String)| -> anyhow::Result<()> {
            ctx.set(ResponseKey, http.request(&method, &uri, Vec::new())?);
            Ok(())
        },
    )?;
    steps.add_step(
        r"^the response code equals (\d+)$",
        |_, ctx, (want,): (i64,)| -> anyhow::Result<()> {
            let given = ctx.get::<Response>(&ResponseKey)?.code.as_u16();
            anyhow::ensure!(
                i64::from(given) == want,
                "expected status code: {want} but {given} given",
            );
            Ok(())
        },
    )?;
    steps.add_step(
        "^the response contains a valid JSON$",
        |_, ctx, (): ()| -> anyhow::Result<()> {
            let body = &ctx.get::<Response>(&ResponseKey)?.body;
            anyhow::ensure!(
                serde_json::from_slice::<serde_json::Value>(body).is_ok(),
                "the body doesn't contain a valid JSON",
            );
            Ok(())
        },
    )?;
    steps.add_step(
        r#"^the response is "(.*)"$"#,
        |_, ctx, (want,): (String,)| -> anyhow::Result<()> {
            let given = ctx.get::<Response>(&ResponseKey)?.text();
            anyhow::ensure!(
                given == want,
                "expected body `{want}` but `{given}` given",
            );
            Ok(())
        },
    )?;
    steps.add_step(
        r#"^the response header "(.*)" equals "(.*)"$"#,
        |_, ctx, (name, want): (String, String)| -> anyhow::Result<()> {
            let response = ctx.get::<Response>(&ResponseKey)?;
            let given = response.header(&name);
            anyhow::ensure!(
                given == want,
                "expected header `{name}` to be `{want}` but `{given}` given",
            );
            Ok(())
        },
    )?;
    steps.add_step(
        r#"^I have a (GET|POST|PUT|DELETE|OPTIONS) request "(.*)"$"#,
        |_, ctx, (method, uri): (String, String)| -> anyhow::Result<()> {
            ctx.set(RequestKey, Request::new(&method, uri)?);
            Ok(())
        },
    )?;
    steps.add_step(
        r#"^I set request header "(.*)" to "(.*)"$"#,
        |_, ctx, (name, value): (String, String)| -> anyhow::Result<()> {
            let mut request = ctx.get::<Request>(&RequestKey)?.clone();
            request.append_header(&name, &value)?;
            ctx.set(RequestKey, request);
            Ok(())
        },
    )?;
    steps.add_step(
        r#"^the request has body "(.*)"$"#,
        |_, ctx, (body,): (String,)| -> anyhow::Result<()> {
            let mut request = ctx.get::<Request>(&RequestKey)?.clone();
            request.body = body.into_bytes();
            ctx.set(RequestKey, request);
            Ok(())
        },
    )?;
    let http = client.clone();
    steps.add_step(
        "^I make the request$",
        move |_, ctx, (): ()| -> anyhow::Result<()> {
            let response = http.send(ctx.get::<Request>(&RequestKey)?)?;
            ctx.set(ResponseKey, response);
            Ok(())
        },
    )?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(request: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        let mut response = http::Response::builder()
            .status(StatusCode::OK)
            .header("X-Method", request.method().as_str())
            .header("X-Uri", request.uri().to_string());
        for (name, value) in request.headers() {
            response = response.header(name, value);
        }
        response.body(request.into_body()).unwrap()
    }

    #[test]
    fn rejects_invalid_method() {
        let http = TestHttp::new(echo);

        assert!(matches!(
            http.request("NOT EXISTS", "/", Vec::new()),
            Err(Error::InvalidMethod { method }) if method == "NOT EXISTS",
        ));
    }

    #[test]
    fn shortcuts_use_their_method() {
        let http = TestHttp::new(echo);

        let response = http.patch("/items/1", "changed").unwrap();
        assert_eq!(response.code, StatusCode::OK);
        assert_eq!(response.header("X-Method"), "PATCH");
        assert_eq!(response.header("X-Uri"), "/items/1");
        assert_eq!(response.text(), "changed");

        assert_eq!(
            http.options("/", Vec::new()).unwrap().header("X-Method"),
            "OPTIONS",
        );
    }

    #[test]
    fn send_passes_headers_and_body() {
        let http = TestHttp::new(echo);
        let mut request = Request::new("POST", "/echo").unwrap();
        request.append_header("Xyz", "ZZZ").unwrap();
        request.append_header("Xyz", "YYY").unwrap();
        request.body = b"ping".to_vec();

        let response = http.send(&request).unwrap();
        assert_eq!(response.text(), "ping");
        assert_eq!(
            response.headers.get_all("Xyz").iter().collect::<Vec<_>>(),
            ["ZZZ", "YYY"],
        );
        assert_eq!(response.header("Absent"), "");
    }

    #[test]
    fn malformed_header_is_refused() {
        let mut request = Request::new("GET", "/").unwrap();

        assert!(request.append_header("bad name", "v").is_err());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn registers_every_step() {
        let mut registry = Registry::new();
        _ = build(&mut registry, echo).unwrap();

        assert_eq!(registry.len(), 9);
        assert!(registry.errors().is_empty());
        assert!(registry
            .find(r#"I set request header "Accept" to "text/plain""#)
            .is_ok());
        assert!(registry.find(r#"I make a PATCH request to "/""#).is_err());
    }
}
