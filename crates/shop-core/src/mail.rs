//! # Delivery Emails
//!
//! Builds the messages that carry download links.

use crate::catalog::Item;
use crate::links::DownloadCode;
use serde::{Deserialize, Serialize};

/// A provider-neutral transactional email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Public URL that redeems `code`
pub fn download_link(server_url: &str, code: &DownloadCode) -> String {
    format!("{}/download/{}", server_url.trim_end_matches('/'), code)
}

/// Email for a single freshly purchased (or re-requested) item
pub fn download_email(to: &str, item: &Item, link: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Download {}", item.name),
        html: format!(
            "<h1>Thank you for purchasing {}</h1>\n\n<a href=\"{}\">Download it now</a>",
            item.name, link
        ),
        text: format!("Thank you for purchasing {}\nDownload it now. {}", item.name, link),
    }
}

/// One email listing every owned item. `None` when there is nothing to send.
pub fn all_downloads_email(to: &str, links: &[(&Item, String)]) -> Option<EmailMessage> {
    if links.is_empty() {
        return None;
    }

    let html = links
        .iter()
        .map(|(item, link)| format!("<a href=\"{}\">Download {}</a>", link, item.name))
        .collect::<Vec<_>>()
        .join("<br>");

    let text = links
        .iter()
        .map(|(item, link)| format!("Download {} {}", item.name, link))
        .collect::<Vec<_>>()
        .join("\n");

    Some(EmailMessage {
        to: to.to_string(),
        subject: "Download your files".to_string(),
        html,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::DownloadLinkRegistry;

    #[test]
    fn test_download_link() {
        let registry = DownloadLinkRegistry::default();
        let code = registry.issue(1);

        assert_eq!(
            download_link("https://api.example.com/", &code),
            format!("https://api.example.com/download/{}", code)
        );
    }

    #[test]
    fn test_single_item_email() {
        let item = Item::new(1, "Learn CSS Today", 1500, "css.pdf", 2);
        let msg = download_email("a@b.com", &item, "https://x/download/abc");

        assert_eq!(msg.to, "a@b.com");
        assert_eq!(msg.subject, "Download Learn CSS Today");
        assert!(msg.html.contains("<a href=\"https://x/download/abc\">Download it now</a>"));
        assert!(msg.text.ends_with("Download it now. https://x/download/abc"));
    }

    #[test]
    fn test_all_downloads_email() {
        let css = Item::new(1, "CSS", 1500, "css.pdf", 2);
        let js = Item::new(2, "JS", 2500, "js.pdf", 3);
        let links = vec![
            (&css, "https://x/download/1".to_string()),
            (&js, "https://x/download/2".to_string()),
        ];

        let msg = all_downloads_email("a@b.com", &links).unwrap();

        assert_eq!(msg.subject, "Download your files");
        assert_eq!(
            msg.html,
            "<a href=\"https://x/download/1\">Download CSS</a><br><a href=\"https://x/download/2\">Download JS</a>"
        );
        assert_eq!(
            msg.text,
            "Download CSS https://x/download/1\nDownload JS https://x/download/2"
        );
    }

    #[test]
    fn test_all_downloads_email_empty() {
        assert!(all_downloads_email("a@b.com", &[]).is_none());
    }
}
