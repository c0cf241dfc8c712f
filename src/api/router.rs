//! Per-instance request routing
//!
//! Maps a request path to a decoded job and runs it. Every path ends in
//! exactly one outcome: content, or a [`ServeError`].

use std::sync::Arc;

use super::error::ServeError;
use crate::content::Content;
use crate::instance::Instance;
use crate::job::JobError;

/// Path left after removing the instance's prefix, or `None` if the path
/// is not under it
fn strip_prefix<'a>(path: &'a str, prefix: Option<&str>) -> Option<&'a str> {
    let rest = match prefix {
        Some(prefix) => path.strip_prefix(prefix)?,
        None => path,
    };
    rest.strip_prefix('/')
}

/// Split `{token}[/{name}]` and percent-decode the name. A present but
/// empty or nested name is invalid.
fn split_name(remainder: &str) -> Option<(&str, Option<String>)> {
    match remainder.split_once('/') {
        None => Some((remainder, None)),
        Some((_, "")) => None,
        Some((_, name)) if name.contains('/') => None,
        Some((token, name)) => Some((token, Some(decode_name(name)?))),
    }
}

/// Percent-decode a name segment. Malformed escapes, invalid UTF-8 and
/// names that decode to a path separator or control character are refused.
fn decode_name(raw: &str) -> Option<String> {
    fn hex(byte: u8) -> Option<u8> {
        match byte {
            b'0'..=b'9' => Some(byte - b'0'),
            b'a'..=b'f' => Some(byte - b'a' + 10),
            b'A'..=b'F' => Some(byte - b'A' + 10),
            _ => None,
        }
    }

    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex(*bytes.get(i + 1)?)?;
            let lo = hex(*bytes.get(i + 2)?)?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    let name = String::from_utf8(out).ok()?;
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return None;
    }
    Some(name)
}

/// Serve `path` from `instance`
pub async fn serve_path(instance: &Arc<Instance>, path: &str) -> Result<Content, ServeError> {
    let settings = instance.settings();
    let metrics = instance.metrics();

    let Some(remainder) = strip_prefix(path, settings.path_prefix.as_deref()) else {
        metrics.cascaded();
        return Err(ServeError::Cascade);
    };

    let Some((token, name)) = split_name(remainder) else {
        metrics.not_found();
        return Err(ServeError::NotFound);
    };

    let job = match instance.decode(token) {
        Ok(job) => job,
        Err(e) if e.is_abusive() && settings.protect_from_dos_attacks => {
            tracing::warn!(instance = %instance.name(), error = %e, "Rejected token");
            metrics.rejected();
            return Err(ServeError::BadRequest);
        }
        Err(e) => {
            tracing::debug!(instance = %instance.name(), error = %e, "Undecodable token");
            metrics.not_found();
            return Err(ServeError::NotFound);
        }
    };

    let mut content = match job.apply().await {
        Ok(content) => content,
        Err(JobError::Backend(message)) => {
            tracing::warn!(instance = %instance.name(), error = %message, "Job failed");
            metrics.failed();
            return Err(ServeError::Internal(message));
        }
        Err(e) => {
            tracing::debug!(instance = %instance.name(), error = %e, "Job produced nothing");
            metrics.not_found();
            return Err(e.into());
        }
    };

    // The URL's name is the weakest hint; anything a step declared wins
    if let Some(name) = name {
        if content.mime_type.is_none() {
            content.mime_type = instance.mime_type_for_name(&name);
        }
        if content.name.is_none() {
            content.name = Some(name);
        }
    }

    tracing::debug!(
        instance = %instance.name(),
        steps = job.steps().len(),
        size = content.len(),
        content_type = content.content_type(),
        "Served content"
    );
    metrics.served();

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Registry;
    use crate::job::Arg;
    use bytes::Bytes;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("/abc", None), Some("abc"));
        assert_eq!(strip_prefix("/media/abc", Some("/media")), Some("abc"));
        assert_eq!(strip_prefix("/abc", Some("/media")), None);
        assert_eq!(strip_prefix("/abc/media", Some("/media")), None);
        assert_eq!(strip_prefix("/mediaabc", Some("/media")), None);
        assert_eq!(strip_prefix("/media", Some("/media")), None);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("tok"), Some(("tok", None)));
        assert_eq!(
            split_name("tok/cat.png"),
            Some(("tok", Some("cat.png".to_string())))
        );
        assert_eq!(split_name("tok/"), None);
        assert_eq!(split_name("tok/a/b"), None);
    }

    #[test]
    fn test_name_is_percent_decoded() {
        assert_eq!(
            split_name("tok/my%20cat.png"),
            Some(("tok", Some("my cat.png".to_string())))
        );
        assert_eq!(
            split_name("tok/caf%C3%A9.gif"),
            Some(("tok", Some("café.gif".to_string())))
        );
    }

    #[test]
    fn test_bad_names_rejected() {
        for raw in [
            "a%2Fb.png",
            "a%2fb.png",
            "a%5Cb.png",
            "a%00.png",
            "a%zz.png",
            "a%2",
            "%FF.png",
        ] {
            assert_eq!(split_name(&format!("tok/{raw}")), None, "{raw}");
        }
    }

    #[tokio::test]
    async fn test_serves_stored_content() {
        let registry = Registry::new();
        let app = registry.instance("default");
        let uid = app.store("HELLO THERE").await.unwrap();
        let url = app.fetch(&uid).url();

        let content = serve_path(&app, &url).await.unwrap();
        assert_eq!(content.data, Bytes::from("HELLO THERE"));
        assert_eq!(app.metrics().snapshot().served, 1);
    }

    #[tokio::test]
    async fn test_name_hint_sets_type() {
        let registry = Registry::new();
        let app = registry.instance("default");
        let uid = app.store("GIF89a").await.unwrap();
        let url = format!("{}/cat.gif", app.fetch(&uid).url());

        let content = serve_path(&app, &url).await.unwrap();
        assert_eq!(content.content_type(), "image/gif");
        assert_eq!(content.name.as_deref(), Some("cat.gif"));

        let encoded = format!("{}/a%2Fb.png", app.fetch(&uid).url());
        assert!(matches!(
            serve_path(&app, &encoded).await,
            Err(ServeError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_step_format_beats_name_hint() {
        let registry = Registry::new();
        let app = registry.instance("default");
        let job = app
            .generate("text", vec![Arg::from("hi")])
            .process("format", vec![Arg::from("json")]);
        let url = format!("{}/data.gif", job.url());

        let content = serve_path(&app, &url).await.unwrap();
        assert_eq!(content.content_type(), "application/json");
    }

    #[tokio::test]
    async fn test_dos_toggle() {
        let registry = Registry::new();
        let app = registry.instance("default");
        app.configure(|c| c.limits.max_steps = 2).unwrap();

        let mut job = app.generate("text", vec![Arg::from("x")]);
        for _ in 0..3 {
            job = job.process("format", vec![Arg::from("txt")]);
        }
        let url = job.url();

        assert!(matches!(
            serve_path(&app, &url).await,
            Err(ServeError::BadRequest)
        ));

        app.configure(|c| c.protect_from_dos_attacks = false).unwrap();
        assert!(matches!(
            serve_path(&app, &url).await,
            Err(ServeError::NotFound)
        ));

        let snapshot = app.metrics().snapshot();
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.not_found, 1);
    }

    #[tokio::test]
    async fn test_garbage_is_not_found_even_when_protected() {
        let registry = Registry::new();
        let app = registry.instance("default");

        assert!(matches!(
            serve_path(&app, "/sadhfasdfdsfsdf").await,
            Err(ServeError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_prefix_mismatch_cascades() {
        let registry = Registry::new();
        let app = registry.instance("images");
        app.configure(|c| c.path_prefix = Some("/media".into())).unwrap();

        assert!(matches!(serve_path(&app, "/abc").await, Err(ServeError::Cascade)));
        assert_eq!(app.metrics().snapshot().cascaded, 1);
    }
}
