//! Request path normalization.

use http::uri::{PathAndQuery, Uri};
use switchyard_core::{BoxFuture, Context, Request, Response};

use crate::middleware::{Middleware, Next};

/// Normalizes the request path before the handler sees it.
///
/// Repeated slashes collapse, `.` segments drop, `..` removes the segment
/// before it (never climbing above `/`), and a trailing slash is removed.
/// The query string is kept. Routing has already happened by the time a
/// stage runs, so this only changes what the handler reads from the URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanPath;

impl Middleware for CleanPath {
    fn name(&self) -> &'static str {
        "clean_path"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let cleaned = clean(request.uri().path());
        if cleaned != request.uri().path() {
            if let Some(uri) = with_path(request.uri(), &cleaned) {
                *request.uri_mut() = uri;
            }
        }
        Box::pin(next.run(ctx, request))
    }
}

/// Lexically normalizes a slash-separated path.
#[must_use]
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut kept: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match kept.last() {
                Some(&last) if last != ".." => {
                    kept.pop();
                }
                _ if !rooted => kept.push(".."),
                _ => {}
            },
            other => kept.push(other),
        }
    }

    let joined = kept.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use switchyard_core::{handler_fn, ResponseExt};

    #[test]
    fn test_clean_rooted_paths() {
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("/a//b"), "/a/b");
        assert_eq!(clean("/a/./b/"), "/a/b");
        assert_eq!(clean("/a/b/../c"), "/a/c");
        assert_eq!(clean("/../../etc"), "/etc");
        assert_eq!(clean("//"), "/");
    }

    #[test]
    fn test_clean_relative_paths() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a/.."), ".");
        assert_eq!(clean("../a/../../b"), "../../b");
    }

    async fn seen_uri(uri: &str) -> String {
        let handler = handler_fn(|_ctx, req| {
            Box::pin(async move { Response::text(StatusCode::OK, req.uri().to_string()) })
        });
        let mut request = Request::new(Bytes::new());
        *request.uri_mut() = uri.parse().unwrap();

        let mut ctx = Context::new();
        let response = CleanPath.process(&mut ctx, request, Next::handler(&handler)).await;
        String::from_utf8_lossy(&response.body_bytes().await).into_owned()
    }

    #[tokio::test]
    async fn test_handler_sees_cleaned_uri() {
        assert_eq!(seen_uri("/files//docs/../img/").await, "/files/img");
        assert_eq!(seen_uri("/a/./b?x=1&y=..").await, "/a/b?x=1&y=..");
    }

    #[tokio::test]
    async fn test_clean_uri_untouched() {
        assert_eq!(seen_uri("/already/clean?q").await, "/already/clean?q");
    }
}
