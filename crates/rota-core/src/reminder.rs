//! Weekly reminder: who cooks next week and who leads the discussion.

use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::RotationEngine;
use crate::error::RotaResult;
use crate::traits::MessageSender;

/// Builds and posts the reminder message.
pub struct Reminder {
    engine: Arc<RotationEngine>,
    sender: Arc<dyn MessageSender>,
    channel: String,
}

impl Reminder {
    pub fn new(
        engine: Arc<RotationEngine>,
        sender: Arc<dyn MessageSender>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            sender,
            channel: channel.into(),
        }
    }

    /// The reminder text, or `None` if nobody is scheduled.
    ///
    /// The discussion is led by the pair following the dinner pair.
    pub fn compose(&self) -> RotaResult<Option<String>> {
        let Some(next) = self.engine.get_next()? else {
            return Ok(None);
        };

        let mut text = format!("{}, you two are on dinners next week!", next.users);
        if let Some(follower) = self.engine.get_follower(next.due_date)? {
            text.push_str(&format!(
                "\n{}, you guys are doing the discussion!",
                follower.users
            ));
        }
        Ok(Some(text))
    }

    /// Post the reminder to the configured channel.
    ///
    /// Returns the posted text, or `None` when there was nothing to post.
    pub async fn post(&self) -> RotaResult<Option<String>> {
        let Some(text) = self.compose()? else {
            warn!("No one scheduled, reminder not posted");
            return Ok(None);
        };

        self.sender.send_text(&self.channel, &text).await?;
        info!(channel = %self.channel, "Reminder posted");
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::FixedClock;
    use crate::store::{RotationStore, SqliteRotationStore};
    use crate::traits::MockMessageSender;
    use crate::types::{Assignment, UserPair};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn engine(pairs: &[(&str, &str)]) -> Arc<RotationEngine> {
        let store = Arc::new(SqliteRotationStore::in_memory().unwrap());
        for (i, (a, b)) in pairs.iter().enumerate() {
            store
                .insert(&Assignment::new(
                    UserPair::new(*a, *b),
                    d(2024, 6, 3) + chrono::Days::new(7 * i as u64),
                ))
                .unwrap();
        }
        // Thursday May 30th: the reminder goes out the week before the first pair is due
        Arc::new(RotationEngine::with_clock(store, Arc::new(FixedClock(d(2024, 5, 30)))))
    }

    #[tokio::test]
    async fn test_post_names_dinner_and_discussion_pairs() {
        let engine = engine(&[("<@A>", "<@B>"), ("<@C>", "<@D>")]);
        let mut sender = MockMessageSender::new();
        sender
            .expect_send_text()
            .withf(|channel, text| channel.to_string() == "C-dinners" && text.contains("<@C> and <@D>"))
            .times(1)
            .returning(|_, _| Ok(()));

        let reminder = Reminder::new(engine, Arc::new(sender), "C-dinners");
        let text = reminder.post().await.unwrap().unwrap();
        assert_eq!(
            text,
            "<@A> and <@B>, you two are on dinners next week!\n\
             <@C> and <@D>, you guys are doing the discussion!"
        );
    }

    #[tokio::test]
    async fn test_single_pair_has_no_discussion_line() {
        let engine = engine(&[("<@A>", "<@B>")]);
        let reminder = Reminder::new(engine, Arc::new(MockMessageSender::new()), "C");
        let text = reminder.compose().unwrap().unwrap();
        assert!(!text.contains("discussion"));
    }

    #[tokio::test]
    async fn test_empty_rotation_posts_nothing() {
        let engine = engine(&[]);
        let mut sender = MockMessageSender::new();
        sender.expect_send_text().never();
        let reminder = Reminder::new(engine, Arc::new(sender), "C");
        assert!(reminder.post().await.unwrap().is_none());
    }
}
