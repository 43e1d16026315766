//! Scanning an open conversation

use crate::config::ClassifierConfig;
use crate::element::Control;
use crate::message::{IdentityKey, MessageRecord};
use crate::registry::{ChatEntry, ChatId, WindowRegistry};
use crate::services::Services;
use crate::types::RuntimeId;
use crate::{classify_message_among, AutomationError};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// One chat surface bound to the services and configuration used to read it.
pub struct ChatView<'a> {
    registry: &'a WindowRegistry,
    chat: ChatId,
    services: Services<'a>,
    config: &'a ClassifierConfig,
}

impl<'a> ChatView<'a> {
    pub fn new(
        registry: &'a WindowRegistry,
        chat: ChatId,
        services: Services<'a>,
        config: &'a ClassifierConfig,
    ) -> Result<Self, AutomationError> {
        if registry.chat(chat).is_none() {
            return Err(AutomationError::InvalidArgument(format!("unknown {chat}")));
        }
        Ok(Self {
            registry,
            chat,
            services,
            config,
        })
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    fn entry(&self) -> Result<&'a ChatEntry, AutomationError> {
        self.registry
            .chat(self.chat)
            .ok_or_else(|| AutomationError::InvalidArgument(format!("unknown {}", self.chat)))
    }

    fn message_controls(&self) -> Result<(Control, Vec<Control>), AutomationError> {
        let entry = self.entry()?;
        let controls = entry.container.children()?;
        Ok((entry.container.clone(), controls))
    }

    fn classify(
        &self,
        control: &Control,
        container: &Control,
        siblings: &[Control],
    ) -> Result<MessageRecord, AutomationError> {
        let entry = self.entry()?;
        Ok(classify_message_among(
            control,
            container,
            siblings,
            self.chat,
            entry.window,
            &self.services,
            self.config,
        ))
    }

    /// Classify every message control currently in the list, top to bottom.
    #[instrument(level = "debug", skip(self), fields(chat = %self.chat))]
    pub fn messages(&self) -> Result<Vec<MessageRecord>, AutomationError> {
        let (container, controls) = self.message_controls()?;
        let records = controls
            .iter()
            .map(|control| self.classify(control, &container, &controls))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Classified {} message(s) in {}", records.len(), self.chat);
        Ok(records)
    }

    /// The bottom-most message, if the list has any.
    pub fn last_message(&self) -> Result<Option<MessageRecord>, AutomationError> {
        let (container, controls) = self.message_controls()?;
        controls
            .last()
            .map(|control| self.classify(control, &container, &controls))
            .transpose()
    }

    /// Classify only the control with this runtime id.
    pub fn message_by_id(&self, id: &RuntimeId) -> Result<Option<MessageRecord>, AutomationError> {
        let (container, controls) = self.message_controls()?;
        controls
            .iter()
            .find(|control| control.runtime_id().ok().as_ref() == Some(id))
            .map(|control| self.classify(control, &container, &controls))
            .transpose()
    }

    /// First message whose content hash equals `hash`.
    pub fn message_by_hash(&self, hash: &str) -> Result<Option<MessageRecord>, AutomationError> {
        Ok(self
            .messages()?
            .into_iter()
            .find(|record| record.hash() == hash))
    }
}

/// Remembers which messages were already reported and yields only new ones.
#[derive(Debug, Default)]
pub struct NewMessageTracker {
    seen: HashSet<IdentityKey>,
}

impl NewMessageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `records` as seen without reporting them.
    pub fn prime(&mut self, records: &[MessageRecord]) {
        for record in records {
            self.seen.insert(record.identity_key());
        }
        debug!("Tracker primed with {} message(s)", self.seen.len());
    }

    /// Records not seen before, in scan order.
    ///
    /// Afterwards only the keys of this scan are remembered, so memory stays
    /// bounded by the list length. A message that left the list and comes
    /// back later is reported again.
    pub fn observe(&mut self, records: Vec<MessageRecord>) -> Vec<MessageRecord> {
        let mut current = HashSet::with_capacity(records.len());
        let fresh: Vec<MessageRecord> = records
            .into_iter()
            .filter(|record| {
                let key = record.identity_key();
                let new = !self.seen.contains(&key);
                current.insert(key) && new
            })
            .collect();
        if self.seen.len() != current.len() || !fresh.is_empty() {
            debug!(
                "Tracker now holds {} key(s), {} new",
                current.len(),
                fresh.len()
            );
        }
        self.seen = current;
        fresh
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}
