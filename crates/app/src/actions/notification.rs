use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::{ActionContext, ActionError, ActionHandler, required_text, text};
use crate::ports::{NotificationLevel, NotificationOptions, NotificationSink};

/// `send-notification`: hand a message to the notification sink.
pub struct SendNotificationHandler<N> {
    sink: N,
}

impl<N> SendNotificationHandler<N> {
    pub fn new(sink: N) -> Self {
        Self { sink }
    }
}

impl<N: NotificationSink> ActionHandler for SendNotificationHandler<N> {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        _ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>> {
        Box::pin(async move {
            let message = required_text(config, "message")?;
            let level = NotificationLevel::parse_lenient(text(config, "level").as_deref());
            let title = text(config, "title");
            self.sink.notify(
                &message,
                level,
                NotificationOptions {
                    title: title.clone(),
                },
            );
            Ok(json!({ "notified": true, "message": message, "level": level, "title": title }))
        })
    }
}
