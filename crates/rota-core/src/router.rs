//! Turn a classified request into exactly one reply string.
//!
//! Scheduling goes to the [`RotationEngine`], names go to the [`NameResolver`].
//! Nothing escapes as an error: every failure is rendered for the user here.

use std::sync::Arc;

use tracing::{error, warn};

use crate::dates::{format_day, upcoming_monday, WeekAnchor};
use crate::engine::RotationEngine;
use crate::error::{RotaError, RotaResult};
use crate::resolver::NameResolver;
use crate::types::{IntentKind, IntentRequest};

pub const NOT_UNDERSTOOD: &str = "Sorry, I don't understand what you said.";
pub const SWAP_NOT_READY: &str = "Whoa, swapping functionality isn't done yet!";
pub const NOTHING_SCHEDULED: &str = "Looks like no one is on the dinner schedule yet!";
pub const STORE_FAILURE: &str =
    "Something went wrong reading the dinner schedule. Try again later.";

/// Dispatches intents to the engine.
pub struct IntentRouter {
    engine: Arc<RotationEngine>,
    resolver: NameResolver,
    bot_user_id: String,
}

impl IntentRouter {
    pub fn new(
        engine: Arc<RotationEngine>,
        resolver: NameResolver,
        bot_user_id: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            resolver,
            bot_user_id: bot_user_id.into(),
        }
    }

    /// Produce the reply for one request.
    pub async fn route(&self, request: &IntentRequest) -> String {
        let result = match request.kind {
            IntentKind::Get => self.handle_get(request).await,
            IntentKind::Skip => self.handle_skip(request).await,
            IntentKind::Swap => Ok(SWAP_NOT_READY.to_string()),
            IntentKind::Unknown => Ok(NOT_UNDERSTOOD.to_string()),
        };

        result.unwrap_or_else(|err| {
            error!(error = %err, code = err.code().as_str(), intent = %request.kind, "Request failed");
            STORE_FAILURE.to_string()
        })
    }

    async fn handle_get(&self, request: &IntentRequest) -> RotaResult<String> {
        if let Some(datetime) = request.datetime {
            let monday = datetime.week_monday();
            return Ok(match self.engine.get_users(monday)? {
                Some(users) => format!("{} are on {}.", users, format_day(monday)),
                None => format!(
                    "Looks like no one is scheduled to be on {}!",
                    format_day(monday)
                ),
            });
        }

        // The bot's own mention is one of the contacts, so a named person means two or more.
        if request.contacts.len() > 1 {
            if let Some(name) = self.first_non_bot_contact(&request.contacts) {
                let user = match self.resolver.resolve(name, &request.requesting_user).await {
                    Ok(user) => user,
                    Err(err @ RotaError::DirectoryUnavailable { .. }) => {
                        warn!(error = %err, name, "Directory lookup failed");
                        return Ok(format!(
                            "I couldn't reach the user directory to look up {}.",
                            name
                        ));
                    }
                    Err(err) => return Err(err),
                };

                return Ok(match self.engine.get_date(&user)? {
                    Some(date) => format!("{} is doing dinner next on {}.", user, format_day(date)),
                    None => format!("Looks like {} isn't on the dinner schedule.", user),
                });
            }
        }

        Ok(match self.engine.get_next()? {
            Some(next) => format!("{} are on next.", next.users),
            None => NOTHING_SCHEDULED.to_string(),
        })
    }

    async fn handle_skip(&self, request: &IntentRequest) -> RotaResult<String> {
        let date = match request.datetime {
            Some(datetime) => datetime.week_monday(),
            None => upcoming_monday(self.engine.today()),
        };

        match self.engine.postpone(date).await {
            Ok(Some(_)) => Ok(format!(
                "I've updated the schedule so there's no dinner on {}.",
                format_day(date)
            )),
            Ok(None) => Ok(format!(
                "Looks like no one is scheduled to be on {}, so there's nothing to skip.",
                format_day(date)
            )),
            Err(RotaError::ScheduleConflict { occupied_on, .. }) => {
                warn!(date = %date, "Skip refused, following week taken");
                Ok(format!(
                    "Couldn't postpone {}: someone is already scheduled on {}.",
                    format_day(date),
                    format_day(occupied_on)
                ))
            }
            Err(err) => Err(err),
        }
    }

    fn first_non_bot_contact<'a>(&self, contacts: &'a [String]) -> Option<&'a str> {
        contacts
            .iter()
            .map(String::as_str)
            .find(|c| !c.contains(self.bot_user_id.as_str()))
    }
}
