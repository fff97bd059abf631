//! Fanout of one SOS to every trusted contact over email and SMS.

use std::future::Future;

use chrono::Utc;
use futures_util::{StreamExt as _, stream};
use haven_core::{
  contact::{ContactId, TrustedContact},
  location::Coordinates,
  user::User,
};

use crate::{
  channel::NotificationChannel,
  compose::{SosMessage, compose},
  config::NotifyConfig,
};

/// Delivers an SOS to a set of contacts and reports how many were reached.
pub trait Notifier: Send + Sync {
  fn notify(
    &self,
    user: &User,
    contacts: &[TrustedContact],
    coordinates: Option<Coordinates>,
    message: Option<&str>,
  ) -> impl Future<Output = usize> + Send;
}

/// What happened for a single contact. `None` means the contact has no
/// address for that channel and nothing was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactDelivery {
  pub contact_id: ContactId,
  pub email:      Option<bool>,
  pub sms:        Option<bool>,
}

impl ContactDelivery {
  /// Whether this contact counts as notified.
  ///
  /// Only a confirmed email counts. SMS is always attempted when a phone
  /// number is present but never contributes to the count.
  pub fn counts_as_notified(&self) -> bool { self.email == Some(true) }
}

/// Fans an SOS out over an email channel and an SMS channel.
///
/// Contacts are processed concurrently (at most `max_concurrency` at a
/// time) and results come back in the order the contacts were given. A
/// failure for one contact never affects another.
pub struct ContactFanout<E, S> {
  email:           E,
  sms:             S,
  app_name:        String,
  max_concurrency: usize,
}

impl<E, S> ContactFanout<E, S>
where
  E: NotificationChannel,
  S: NotificationChannel,
{
  pub fn new(email: E, sms: S, config: NotifyConfig) -> Self {
    Self {
      email,
      sms,
      app_name: config.app_name,
      max_concurrency: config.max_concurrency.max(1),
    }
  }

  /// Attempt every contact and return one [`ContactDelivery`] per contact,
  /// in input order.
  pub async fn deliver(
    &self,
    user: &User,
    contacts: &[TrustedContact],
    coordinates: Option<Coordinates>,
    message: Option<&str>,
  ) -> Vec<ContactDelivery> {
    let composed = compose(&self.app_name, &user.username, Utc::now(), coordinates, message);

    let pending: Vec<_> = contacts
      .iter()
      .map(|contact| self.deliver_one(contact, &composed))
      .collect();

    stream::iter(pending)
      .buffered(self.max_concurrency)
      .collect()
      .await
  }

  async fn deliver_one(
    &self,
    contact: &TrustedContact,
    message: &SosMessage,
  ) -> ContactDelivery {
    let email = match usable(contact.email.as_deref()) {
      Some(address) => Some(self.email.send(address, &message.subject, &message.body).await),
      None => None,
    };

    let sms = match usable(contact.phone_number.as_deref()) {
      Some(number) => Some(self.sms.send(number, &message.subject, &message.sms_body).await),
      None => None,
    };

    if email.is_none() && sms.is_none() {
      tracing::debug!(contact_id = contact.id, "trusted contact has no usable channel");
    }

    ContactDelivery { contact_id: contact.id, email, sms }
  }
}

fn usable(address: Option<&str>) -> Option<&str> {
  address.map(str::trim).filter(|a| !a.is_empty())
}

impl<E, S> Notifier for ContactFanout<E, S>
where
  E: NotificationChannel,
  S: NotificationChannel,
{
  async fn notify(
    &self,
    user: &User,
    contacts: &[TrustedContact],
    coordinates: Option<Coordinates>,
    message: Option<&str>,
  ) -> usize {
    let deliveries = self.deliver(user, contacts, coordinates, message).await;
    let notified = deliveries
      .iter()
      .filter(|d| d.counts_as_notified())
      .count();

    tracing::info!(
      user_id = user.id,
      contacts = contacts.len(),
      notified,
      "SOS fanout complete"
    );
    notified
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::HashSet, sync::Mutex, time::Duration};

  use haven_core::contact::DEFAULT_PRIORITY;

  use super::*;

  /// Records every send; fails for recipients listed in `failing`.
  #[derive(Default)]
  struct FakeChannel {
    sent:    Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
    delay:   Option<Duration>,
  }

  impl FakeChannel {
    fn failing(recipients: &[&str]) -> Self {
      Self {
        failing: recipients.iter().map(|r| r.to_string()).collect(),
        ..Self::default()
      }
    }

    fn recipients(&self) -> Vec<String> {
      self.sent.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }
  }

  impl NotificationChannel for FakeChannel {
    async fn send(&self, recipient: &str, _subject: &str, body: &str) -> bool {
      if let Some(delay) = self.delay {
        tokio::time::sleep(delay).await;
      }
      self.sent.lock().unwrap().push((recipient.to_owned(), body.to_owned()));
      !self.failing.contains(recipient)
    }
  }

  fn user() -> User {
    User { id: 7, username: "alice".into(), email: "alice@example.com".into() }
  }

  fn contact(id: i64, email: Option<&str>, phone: Option<&str>) -> TrustedContact {
    TrustedContact {
      id,
      user_id:      7,
      name:         format!("contact {id}"),
      email:        email.map(str::to_owned),
      phone_number: phone.map(str::to_owned),
      priority:     DEFAULT_PRIORITY,
      sos_enabled:  true,
    }
  }

  fn fanout(email: FakeChannel, sms: FakeChannel) -> ContactFanout<FakeChannel, FakeChannel> {
    ContactFanout::new(email, sms, NotifyConfig::default())
  }

  #[tokio::test]
  async fn all_emails_succeeding_counts_every_contact() {
    let f = fanout(FakeChannel::default(), FakeChannel::default());
    let contacts = [
      contact(1, Some("a@example.com"), None),
      contact(2, Some("b@example.com"), None),
      contact(3, Some("c@example.com"), None),
    ];

    assert_eq!(f.notify(&user(), &contacts, None, None).await, 3);
    assert!(f.sms.recipients().is_empty());
  }

  #[tokio::test]
  async fn sms_only_contact_is_attempted_but_not_counted() {
    let f = fanout(FakeChannel::default(), FakeChannel::default());
    let contacts = [contact(1, None, Some("+15550001"))];

    assert_eq!(f.notify(&user(), &contacts, None, None).await, 0);
    assert_eq!(f.sms.recipients(), ["+15550001"]);
  }

  #[tokio::test]
  async fn contact_with_both_channels_counts_once() {
    let f = fanout(FakeChannel::default(), FakeChannel::default());
    let contacts = [contact(1, Some("a@example.com"), Some("+15550001"))];

    assert_eq!(f.notify(&user(), &contacts, None, None).await, 1);
    assert_eq!(f.email.recipients(), ["a@example.com"]);
    assert_eq!(f.sms.recipients(), ["+15550001"]);
  }

  #[tokio::test]
  async fn sms_is_sent_even_when_email_fails() {
    let f = fanout(FakeChannel::failing(&["a@example.com"]), FakeChannel::default());
    let contacts = [contact(1, Some("a@example.com"), Some("+15550001"))];

    let deliveries = f.deliver(&user(), &contacts, None, None).await;
    assert_eq!(
      deliveries,
      [ContactDelivery { contact_id: 1, email: Some(false), sms: Some(true) }]
    );
    assert_eq!(f.sms.recipients(), ["+15550001"]);
  }

  #[tokio::test]
  async fn contact_without_channels_contributes_nothing() {
    let f = fanout(FakeChannel::default(), FakeChannel::default());
    let contacts = [contact(1, None, None), contact(2, Some("  "), Some(""))];

    let deliveries = f.deliver(&user(), &contacts, None, None).await;
    assert!(deliveries.iter().all(|d| d.email.is_none() && d.sms.is_none()));
    assert_eq!(f.notify(&user(), &contacts, None, None).await, 0);
    assert!(f.email.recipients().is_empty());
    assert!(f.sms.recipients().is_empty());
  }

  #[tokio::test]
  async fn one_failure_does_not_stop_the_rest() {
    let f = fanout(FakeChannel::failing(&["b@example.com"]), FakeChannel::default());
    let contacts = [
      contact(1, Some("a@example.com"), None),
      contact(2, Some("b@example.com"), None),
      contact(3, Some("c@example.com"), None),
    ];

    assert_eq!(f.notify(&user(), &contacts, None, None).await, 2);
    let mut attempted = f.email.recipients();
    attempted.sort();
    assert_eq!(attempted, ["a@example.com", "b@example.com", "c@example.com"]);
  }

  #[tokio::test]
  async fn deliveries_keep_contact_order() {
    let slow = FakeChannel { delay: Some(Duration::from_millis(5)), ..FakeChannel::default() };
    let f = fanout(slow, FakeChannel::default());
    let contacts: Vec<_> = (1..=6)
      .map(|i| contact(i, Some(format!("c{i}@example.com").as_str()), None))
      .collect();

    let ids: Vec<_> = f
      .deliver(&user(), &contacts, None, None)
      .await
      .into_iter()
      .map(|d| d.contact_id)
      .collect();
    assert_eq!(ids, [1, 2, 3, 4, 5, 6]);
  }

  #[tokio::test]
  async fn message_and_location_reach_both_channels() {
    let f = fanout(FakeChannel::default(), FakeChannel::default());
    let contacts = [contact(1, Some("a@example.com"), Some("+15550001"))];
    let coords = Coordinates { latitude: 10.0, longitude: 20.0 };

    f.notify(&user(), &contacts, Some(coords), Some("help")).await;

    let email_body = f.email.sent.lock().unwrap()[0].1.clone();
    let sms_body = f.sms.sent.lock().unwrap()[0].1.clone();
    assert!(email_body.contains("User Message: help"));
    assert!(email_body.contains("query=10,20"));
    assert_eq!(
      sms_body,
      "SOS from alice. Msg: help. Location Link: \
       https://www.google.com/maps/search/?api=1&query=10,20"
    );
  }

  #[tokio::test]
  async fn empty_contact_set_notifies_nobody() {
    let f = fanout(FakeChannel::default(), FakeChannel::default());
    assert_eq!(f.notify(&user(), &[], None, None).await, 0);
  }
}
