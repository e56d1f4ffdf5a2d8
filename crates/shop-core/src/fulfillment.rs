//! # Fulfillment Flow
//!
//! Stitches a confirmed purchase (or a link-recovery request) to contact
//! tagging, download-code issuance and email delivery.
//!
//! The contact directory is the authoritative purchase record: an email owns
//! an item when its contact belongs to that item's list.

use crate::catalog::{Catalog, Item};
use crate::error::{ShopError, ShopResult};
use crate::links::{DownloadCode, DownloadLinkRegistry};
use crate::mail;
use crate::provider::{BoxedContactDirectory, BoxedMailer};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Purchase-to-delivery orchestration.
///
/// Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct Fulfillment {
    catalog: Arc<Catalog>,
    links: DownloadLinkRegistry,
    contacts: BoxedContactDirectory,
    mailer: BoxedMailer,
    server_url: String,
}

impl Fulfillment {
    /// `server_url` is the public base that download links point at.
    pub fn new(
        catalog: Arc<Catalog>,
        links: DownloadLinkRegistry,
        contacts: BoxedContactDirectory,
        mailer: BoxedMailer,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            links,
            contacts,
            mailer,
            server_url: server_url.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn links(&self) -> &DownloadLinkRegistry {
        &self.links
    }

    /// Issue a code for one item and email it.
    ///
    /// The item is looked up before anything is issued. A failed send is
    /// returned to the caller but the code stays valid until it expires.
    #[instrument(skip(self, email))]
    pub async fn fulfill_single(&self, email: &str, item_id: u32) -> ShopResult<DownloadCode> {
        let item = self.catalog.find_by_id(item_id)?;
        require_email(email)?;

        let code = self.links.issue(item.id);
        let link = mail::download_link(&self.server_url, &code);

        self.mailer
            .send(&mail::download_email(email, item, &link))
            .await
            .map_err(|e| {
                error!("Failed to send download email for item {}: {}", item.id, e);
                e
            })?;

        info!("Sent download link for item {}", item.id);
        Ok(code)
    }

    /// Issue a code for every item the email owns and send them in one message.
    ///
    /// Returns the number of links sent; zero means no email went out.
    #[instrument(skip(self, email))]
    pub async fn fulfill_all(&self, email: &str) -> ShopResult<usize> {
        if email.trim().is_empty() {
            warn!("Link recovery requested without an email");
            return Ok(0);
        }

        let items = self.purchased_items(email).await?;
        let links: Vec<(&Item, String)> = items
            .into_iter()
            .map(|item| {
                let code = self.links.issue(item.id);
                (item, mail::download_link(&self.server_url, &code))
            })
            .collect();

        let Some(message) = mail::all_downloads_email(email, &links) else {
            info!("No purchased items for link recovery request");
            return Ok(0);
        };

        self.mailer.send(&message).await?;
        info!("Sent {} download links", links.len());

        Ok(links.len())
    }

    /// Record a confirmed purchase, then deliver the item.
    ///
    /// Tagging the contact is best-effort: failures are logged and delivery
    /// continues.
    #[instrument(skip(self, email))]
    pub async fn record_purchase(&self, email: &str, item_id: u32) -> ShopResult<DownloadCode> {
        let item = self.catalog.find_by_id(item_id)?;

        if let Err(e) = self.link_contact_and_item(email, item).await {
            warn!("Could not tag purchaser for item {}: {}", item.id, e);
        }

        self.fulfill_single(email, item.id).await
    }

    /// Put the contact on the item's list, creating the contact if needed.
    pub async fn link_contact_and_item(&self, email: &str, item: &Item) -> ShopResult<()> {
        require_email(email)?;

        match self.contacts.find_contact(email).await? {
            Some(contact) if contact.list_ids.contains(&item.list_id) => {
                debug!("Contact {} already on list {}", contact.id, item.list_id);
                Ok(())
            }
            Some(contact) => self.contacts.add_to_list(contact.id, item.list_id).await,
            None => self.contacts.create_contact(email, item.list_id).await,
        }
    }

    /// Items the email has bought. No email or no contact means nothing.
    pub async fn purchased_items(&self, email: &str) -> ShopResult<Vec<&Item>> {
        if email.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(match self.contacts.find_contact(email).await? {
            Some(contact) => self.catalog.purchased_by(&contact.list_ids),
            None => Vec::new(),
        })
    }

    /// `record_purchase` on a detached task; errors only reach the log.
    pub fn spawn_record_purchase(&self, email: String, item_id: u32) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.record_purchase(&email, item_id).await {
                error!("Post-purchase fulfillment failed for item {}: {}", item_id, e);
            }
        })
    }

    /// `fulfill_all` on a detached task; errors only reach the log.
    pub fn spawn_fulfill_all(&self, email: String) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.fulfill_all(&email).await {
                error!("Link recovery failed: {}", e);
            }
        })
    }
}

fn require_email(email: &str) -> ShopResult<()> {
    if email.trim().is_empty() {
        warn!("Email is missing");
        return Err(ShopError::MissingField { field: "email" });
    }
    Ok(())
}
