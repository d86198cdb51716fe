//! Server-rendered pages for the browser-facing routes.
//!
//! A bucket index, an object listing with upload and delete forms, and an
//! error page. Every interpolated value goes through [`html_escape`].

use crate::models::{bucket::Bucket, permission::CapabilitySet, user::User};
use axum::http::StatusCode;

fn layout(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>",
            "<html><head><meta charset=\"utf-8\"><title>{title}</title></head>",
            "<body>{body}</body></html>"
        ),
        title = html_escape(title),
        body = body
    )
}

pub fn bucket_index(user: &User, buckets: &[Bucket]) -> String {
    let mut body = format!(
        "<h1>Buckets</h1><p>Signed in as {}</p>",
        html_escape(&user.username)
    );
    if buckets.is_empty() {
        body.push_str("<p>No buckets available.</p>");
    } else {
        body.push_str("<ul>");
        for bucket in buckets {
            body.push_str(&format!(
                "<li><a href=\"/buckets/{}/\">{}</a> ({})</li>",
                bucket.id,
                html_escape(&bucket.name),
                html_escape(&bucket.region)
            ));
        }
        body.push_str("</ul>");
    }
    layout("Buckets", &body)
}

pub fn object_listing(bucket: &Bucket, caps: CapabilitySet, keys: &[String]) -> String {
    let mut body = format!(
        "<p><a href=\"/buckets/\">All buckets</a></p><h1>{}</h1>",
        html_escape(&bucket.name)
    );
    if let Some(prefix) = bucket.prefix.as_deref() {
        body.push_str(&format!("<p>Prefix: <code>{}</code></p>", html_escape(prefix)));
    }

    if caps.upload {
        body.push_str(&format!(
            concat!(
                "<form method=\"post\" action=\"/buckets/{}/upload/\" enctype=\"multipart/form-data\">",
                "<input type=\"file\" name=\"file\"><button type=\"submit\">Upload</button>",
                "</form>"
            ),
            bucket.id
        ));
    }

    if keys.is_empty() {
        body.push_str("<p>No objects.</p>");
    } else {
        body.push_str("<ul>");
        for key in keys {
            body.push_str("<li>");
            body.push_str(&html_escape(key));
            if caps.delete {
                body.push_str(&format!(
                    concat!(
                        " <form method=\"post\" action=\"/buckets/{}/delete/\" style=\"display:inline\">",
                        "<input type=\"hidden\" name=\"key\" value=\"{}\">",
                        "<button type=\"submit\">Delete</button></form>"
                    ),
                    bucket.id,
                    html_escape(key)
                ));
            }
            body.push_str("</li>");
        }
        body.push_str("</ul>");
    }

    layout(&bucket.name, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h1>{} {}</h1><p>{}</p><p><a href=\"/buckets/\">Back to buckets</a></p>",
        status.as_u16(),
        html_escape(title),
        html_escape(message)
    );
    layout(title, &body)
}

pub fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> Bucket {
        Bucket {
            id: 7,
            name: "media".into(),
            region: "eu-west-1".into(),
            prefix: Some("team/".into()),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn listing_shows_forms_per_capability() {
        let keys = vec!["team/<b>.txt".to_string()];
        let view_only = object_listing(&bucket(), CapabilitySet { view: true, ..Default::default() }, &keys);
        assert!(view_only.contains("team/&lt;b&gt;.txt"));
        assert!(!view_only.contains("/buckets/7/upload/"));
        assert!(!view_only.contains("/buckets/7/delete/"));

        let full = object_listing(
            &bucket(),
            CapabilitySet {
                view: true,
                upload: true,
                delete: true,
            },
            &keys,
        );
        assert!(full.contains("action=\"/buckets/7/upload/\""));
        assert!(full.contains("value=\"team/&lt;b&gt;.txt\""));
    }

    #[test]
    fn error_page_carries_status() {
        let page = error_page(StatusCode::NOT_FOUND, "Not found.");
        assert!(page.contains("404 Not Found"));
    }
}
