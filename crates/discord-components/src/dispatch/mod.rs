//! Routing decoded interactions to the code waiting for them
//!
//! Each interaction fed to [`ComponentsClient::handle_gateway_event`] is
//! delivered, in order, to:
//! 1. one-shot waiters registered with [`ComponentsClient::wait_for`],
//! 2. the persistent callback registered for its custom ID with
//!    [`ComponentsClient::add_callback`],
//! 3. listeners registered with [`ComponentsClient::on`], first those for
//!    [`EventKind::Interaction`] and then those for the specific kind.
//!
//! Waiters are resolved before [`handle_gateway_event`] returns.  Callbacks
//! and listeners each run on their own task, so a handler may itself wait for
//! a later interaction.  A handler that fails or panics is logged and does
//! not affect the others.
//!
//! [`handle_gateway_event`]: ComponentsClient::handle_gateway_event

mod callback;
mod filter;

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    panic::AssertUnwindSafe,
    sync::Arc,
    time::Duration,
};

pub use callback::ComponentHandler;
use callback::{Callback, Callbacks};
pub use filter::{
    channel_filter, component_filter, guild_filter, message_filter, user_filter, Filter,
};
use futures_util::FutureExt;
use serde_json::{json, Value};
use serenity::{
    client::{Context, EventHandler},
    http::Http,
    model::{
        application,
        id::{ChannelId, MessageId},
    },
};
use tokio::{
    sync::{oneshot, Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{error, instrument, trace, Instrument};

use crate::{
    component::{AsCustomId, ComponentType},
    config::ClientOptions,
    http::{Method, Request, Route, Transport},
    interaction::{self, Interaction},
    message::{ComponentMessage, MessageBody, MessageReference, PreparedMessage},
    response::Prepare,
    ArgumentError, Error, ProtocolError,
};

/// The kinds of event interactions are broadcast under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Every component interaction
    Interaction,
    /// Button clicks only
    ButtonClick,
    /// Select menu choices only
    SelectOption,
}

impl EventKind {
    /// The specific kind for interactions with the given component type
    #[must_use]
    pub fn of(ty: ComponentType) -> Option<Self> {
        match ty {
            ComponentType::Button => Some(Self::ButtonClick),
            ComponentType::Select => Some(Self::SelectOption),
            ComponentType::ActionRow => None,
        }
    }

    /// The name of this event
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Interaction => "interaction",
            Self::ButtonClick => "button_click",
            Self::SelectOption => "select_option",
        }
    }

    /// Whether an interaction is delivered under this kind
    #[must_use]
    pub fn includes(self, int: &Interaction) -> bool {
        self == Self::Interaction || Self::of(int.component_type()) == Some(self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug)]
struct Waiter {
    kind: EventKind,
    filter: Filter,
    tx: oneshot::Sender<Arc<Interaction>>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    opts: Arc<ClientOptions>,
    waiters: Mutex<Vec<Waiter>>,
    callbacks: Callbacks,
    listeners: RwLock<HashMap<EventKind, Vec<Arc<dyn ComponentHandler>>>>,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner")
            .field("transport", &self.transport)
            .field("opts", &self.opts)
            .field("waiters", &self.waiters)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

/// A delivered interaction and the handler tasks it started
///
/// Dropping this leaves the handlers running in the background.
#[derive(Debug)]
pub struct Dispatched {
    int: Arc<Interaction>,
    tasks: Vec<JoinHandle<()>>,
}

impl Dispatched {
    /// The decoded interaction
    #[inline]
    #[must_use]
    pub fn interaction(&self) -> &Arc<Interaction> { &self.int }

    /// The number of callbacks and listeners started for this interaction
    #[inline]
    #[must_use]
    pub fn handlers(&self) -> usize { self.tasks.len() }

    /// Wait for every handler started for this interaction to finish
    pub async fn join(self) -> Arc<Interaction> {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Handler task did not complete: {e}");
            }
        }

        self.int
    }
}

/// Entry point for sending component messages and receiving interactions
///
/// Cloning a client is cheap, and all clones share their registrations.
#[derive(Debug, Clone)]
pub struct ComponentsClient(Arc<Inner>);

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[instrument(level = "trace", skip(handler, int), fields(custom_id = int.custom_id()))]
async fn invoke(what: &'static str, handler: Arc<dyn ComponentHandler>, int: Arc<Interaction>) {
    match AssertUnwindSafe(handler.handle(Arc::clone(&int)))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => (),
        Ok(Err(e)) => error!("Error in {what}: {e:?}"),
        Err(p) => error!("Panic in {what}: {}", panic_message(&*p)),
    }
}

impl ComponentsClient {
    /// Construct a client sending requests through the given transport
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, opts: ClientOptions) -> Self {
        Self(Arc::new(Inner {
            transport,
            opts: Arc::new(opts),
            waiters: Mutex::default(),
            callbacks: Callbacks::default(),
            listeners: RwLock::default(),
        }))
    }

    /// Construct a client using a serenity HTTP client
    #[must_use]
    pub fn from_http(http: Arc<Http>, opts: ClientOptions) -> Self { Self::new(http, opts) }

    /// The options this client was created with
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions { &self.0.opts }

    /// Decode a gateway event and deliver it to everything waiting for it
    ///
    /// Returns the decoded interaction along with the handler tasks it
    /// started, or `None` if the event was not a component interaction.
    ///
    /// # Errors
    /// This method returns an error if the event looks like a component
    /// interaction but cannot be decoded.  Handler failures are logged, not
    /// returned.
    pub async fn handle_gateway_event(&self, event: &Value) -> Result<Option<Dispatched>, Error> {
        let Some(int) = interaction::decode(
            event,
            Arc::clone(&self.0.transport),
            Arc::clone(&self.0.opts),
        )?
        else {
            return Ok(None);
        };

        let int = Arc::new(int);
        let tasks = self.dispatch(&int).await;
        Ok(Some(Dispatched { int, tasks }))
    }

    #[instrument(level = "debug", skip(self, int), fields(custom_id = int.custom_id()))]
    async fn dispatch(&self, int: &Arc<Interaction>) -> Vec<JoinHandle<()>> {
        {
            let mut waiters = self.0.waiters.lock().await;
            let pending = std::mem::take(&mut *waiters);
            for waiter in pending {
                if waiter.tx.is_closed() {
                    trace!(kind = %waiter.kind, "Dropping abandoned waiter");
                } else if waiter.kind.includes(int) && waiter.filter.matches(int) {
                    if waiter.tx.send(Arc::clone(int)).is_err() {
                        trace!("Waiter went away before delivery");
                    }
                } else {
                    waiters.push(waiter);
                }
            }
        }

        let mut tasks = vec![];
        let mut spawn = |what: &'static str, handler: Arc<dyn ComponentHandler>| {
            tasks.push(tokio::spawn(
                invoke(what, handler, Arc::clone(int)).in_current_span(),
            ));
        };

        if let Some(handler) = self.0.callbacks.take(int).await {
            spawn("component callback", handler);
        }

        let kinds = [EventKind::Interaction]
            .into_iter()
            .chain(EventKind::of(int.component_type()));
        for kind in kinds {
            let handlers = self
                .0
                .listeners
                .read()
                .await
                .get(&kind)
                .cloned()
                .unwrap_or_default();

            for handler in handlers {
                spawn(kind.name(), handler);
            }
        }

        tasks
    }

    /// Register a listener for every interaction of the given kind
    pub async fn on(&self, kind: EventKind, handler: impl ComponentHandler) {
        self.0
            .listeners
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Wait for the next interaction of the given kind that matches `filter`
    ///
    /// If `timeout` is `None` the client's default wait timeout is used, and
    /// if there is none the wait is unbounded.
    ///
    /// # Errors
    /// This method returns [`Error::TimedOut`] if the timeout elapses first,
    /// or [`Error::Closed`] if the client is dropped while waiting.
    pub async fn wait_for(
        &self,
        kind: EventKind,
        filter: Filter,
        timeout: Option<Duration>,
    ) -> Result<Arc<Interaction>, Error> {
        let (tx, rx) = oneshot::channel();
        self.0
            .waiters
            .lock()
            .await
            .push(Waiter { kind, filter, tx });

        let res = match timeout.or(self.0.opts.default_wait_timeout()) {
            Some(t) => {
                let res = tokio::time::timeout(t, rx).await;
                if let Ok(res) = res {
                    res
                } else {
                    self.0.waiters.lock().await.retain(|w| !w.tx.is_closed());
                    return Err(Error::TimedOut);
                }
            },
            None => rx.await,
        };

        res.map_err(|_| Error::Closed)
    }

    /// Register a persistent callback for a component
    ///
    /// The handler runs for every interaction with the component's custom ID
    /// that passes `filter`, up to `uses` times if given.  Registering a
    /// callback for a custom ID that already has one replaces it.
    ///
    /// # Errors
    /// This method returns an error if the component has no custom ID.
    pub async fn add_callback<C: AsCustomId + ?Sized>(
        &self,
        component: &C,
        handler: impl ComponentHandler,
        uses: Option<u32>,
        filter: Option<Filter>,
    ) -> Result<(), ArgumentError> {
        let custom_id = component
            .as_custom_id()
            .ok_or(ArgumentError::NoCustomId)?
            .to_owned();

        self.0
            .callbacks
            .insert(custom_id, Callback {
                handler: Arc::new(handler),
                uses,
                filter,
            })
            .await;
        Ok(())
    }

    /// Remove the persistent callback for a custom ID, returning whether one
    /// was registered
    pub async fn remove_callback(&self, custom_id: &str) -> bool {
        self.0.callbacks.remove(custom_id).await
    }

    async fn message_request(&self, req: Request) -> Result<ComponentMessage, Error> {
        let msg = self
            .0
            .transport
            .request(req)
            .await?
            .ok_or(ProtocolError::MissingField("message"))?;

        Ok(ComponentMessage::from_wire(msg)?)
    }

    fn prepare_body(&self, body: MessageBody) -> Result<PreparedMessage, Error> {
        let mut prepared = body.prepare()?;
        prepared.apply_defaults(&self.0.opts, false);
        Ok(prepared)
    }

    /// Send a message with components to a channel
    ///
    /// # Errors
    /// This method returns an error if `body` is invalid, the request fails,
    /// or the sent message cannot be decoded.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn send_message(
        &self,
        channel_id: ChannelId,
        body: MessageBody,
    ) -> Result<ComponentMessage, Error> {
        let body = self.prepare_body(body)?;
        self.message_request(body.into_request(Method::Post, Route::ChannelMessages { channel_id }))
            .await
    }

    /// Send a message replying to another message
    ///
    /// Whether the reply pings the original author is controlled by
    /// [`MessageBody::mention_author`].
    ///
    /// # Errors
    /// This method returns an error for the same reasons as
    /// [`send_message`](Self::send_message).
    pub async fn reply(
        &self,
        to: &ComponentMessage,
        body: MessageBody,
    ) -> Result<ComponentMessage, Error> {
        let mut reference = MessageReference::to(to.channel_id(), to.id());
        reference.guild_id = to.guild_id();
        self.send_message(to.channel_id(), body.reference(reference)).await
    }

    /// Edit a message, replacing the parts set in `body`
    ///
    /// # Errors
    /// This method returns an error if `body` is invalid, the request fails,
    /// or the edited message cannot be decoded.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        body: MessageBody,
    ) -> Result<ComponentMessage, Error> {
        let body = self.prepare_body(body)?;
        self.message_request(body.into_request(Method::Patch, Route::ChannelMessage {
            channel_id,
            message_id,
        }))
        .await
    }

    /// Fetch a message and decode its components
    ///
    /// # Errors
    /// This method returns an error if the request fails or the message cannot
    /// be decoded.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<ComponentMessage, Error> {
        self.message_request(Request::new(Method::Get, Route::ChannelMessage {
            channel_id,
            message_id,
        }))
        .await
    }
}

#[instrument(skip(f))]
async fn handler(method: &'static str, f: impl std::future::Future<Output = anyhow::Result<()>>) {
    match f.await {
        Ok(()) => (),
        Err(e) => error!("Error in {method}: {e:?}"),
    }
}

#[async_trait::async_trait]
impl EventHandler for ComponentsClient {
    async fn interaction_create(&self, _: Context, int: application::Interaction) {
        let application::Interaction::Component(int) = int else {
            return;
        };

        handler("interaction_create", async move {
            use anyhow::Context as _;

            let mut d = serde_json::to_value(&int).context("Error serializing interaction")?;
            d["type"] = interaction::COMPONENT_INTERACTION.into();

            self.handle_gateway_event(&json!({ "t": interaction::INTERACTION_CREATE, "d": d }))
                .await
                .context("Error dispatching component interaction")?;
            Ok(())
        })
        .await;
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use serde_json::json;
    use serenity::{
        builder::CreateAttachment,
        model::id::{ChannelId, MessageId, UserId},
    };

    use super::{user_filter, ComponentHandler, ComponentsClient, EventKind, Filter};
    use crate::{
        component::{Button, ButtonStyle, Wire},
        config::ClientOptions,
        http::{mock::MockTransport, Method, Route},
        interaction::{fixtures, Interaction},
        message::MessageBody,
        Error,
    };

    fn client() -> (ComponentsClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        (
            ComponentsClient::new(Arc::clone(&transport) as _, ClientOptions::default()),
            transport,
        )
    }

    fn click(custom_id: &str, user: &str) -> serde_json::Value {
        let mut event = fixtures::envelope(
            json!({ "custom_id": custom_id, "component_type": 2 }),
            None,
        );
        event["d"]["member"]["user"]["id"] = user.into();
        event
    }

    async fn explode(_: Arc<Interaction>) -> anyhow::Result<()> { panic!("callback panicked") }

    async fn deliver(client: &ComponentsClient, event: &serde_json::Value) -> Arc<Interaction> {
        client
            .handle_gateway_event(event)
            .await
            .unwrap()
            .unwrap()
            .join()
            .await
    }

    fn counter() -> (Arc<AtomicUsize>, impl ComponentHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: Arc<Interaction>| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_single_use_callback() {
        let (client, _) = client();
        let (count, handler) = counter();

        client
            .add_callback("ok", handler, Some(1), None)
            .await
            .unwrap();

        deliver(&client, &click("ok", "500")).await;
        deliver(&client, &click("ok", "500")).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!client.remove_callback("ok").await);
    }

    #[tokio::test]
    async fn test_zero_uses_never_fires() {
        let (client, _) = client();
        let (count, handler) = counter();

        client
            .add_callback("ok", handler, Some(0), None)
            .await
            .unwrap();
        deliver(&client, &click("ok", "500")).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!client.remove_callback("ok").await);
    }

    #[tokio::test]
    async fn test_filtered_callback_keeps_uses() {
        let (client, _) = client();
        let (count, handler) = counter();

        client
            .add_callback("ok", handler, Some(1), Some(user_filter(UserId::new(501))))
            .await
            .unwrap();

        deliver(&client, &click("ok", "500")).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        deliver(&client, &click("ok", "501")).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_callback_rejects_link() {
        let (client, _) = client();
        let (_, handler) = counter();
        let link = Button::link("https://example.com", "Site").unwrap();

        assert!(client.add_callback(&link, handler, None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_user() {
        let (client, _) = client();

        let waiting = tokio::spawn({
            let client = client.clone();
            async move {
                client
                    .wait_for(
                        EventKind::ButtonClick,
                        user_filter(UserId::new(501)),
                        Some(Duration::from_secs(60)),
                    )
                    .await
            }
        });
        tokio::task::yield_now().await;

        deliver(&client, &click("ok", "500")).await;
        deliver(&client, &click("ok", "501")).await;

        let int = waiting.await.unwrap().unwrap();
        assert_eq!(int.user_id(), UserId::new(501));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout() {
        let (client, _) = client();

        let res = client
            .wait_for(
                EventKind::Interaction,
                Filter::new(),
                Some(Duration::from_secs(5)),
            )
            .await;
        assert!(matches!(res, Err(Error::TimedOut)));
        assert!(client.0.waiters.lock().await.is_empty());

        let (client, _) = {
            let transport = Arc::new(MockTransport::new());
            let opts = ClientOptions::new().wait_timeout(Duration::from_secs(1));
            (
                ComponentsClient::new(Arc::clone(&transport) as _, opts),
                transport,
            )
        };
        let res = client
            .wait_for(EventKind::SelectOption, Filter::new(), None)
            .await;
        assert!(matches!(res, Err(Error::TimedOut)));
        assert!(client.0.waiters.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_wait_inside_callback() {
        let (client, _) = client();
        let next = Arc::new(std::sync::Mutex::new(None));

        let handler = {
            let client = client.clone();
            let next = Arc::clone(&next);
            move |_: Arc<Interaction>| {
                let client = client.clone();
                let next = Arc::clone(&next);
                async move {
                    let int = client
                        .wait_for(
                            EventKind::ButtonClick,
                            Filter::new(),
                            Some(Duration::from_secs(10)),
                        )
                        .await?;
                    *next.lock().unwrap() = Some(int.custom_id().to_owned());
                    anyhow::Ok(())
                }
            }
        };
        client
            .add_callback("first", handler, Some(1), None)
            .await
            .unwrap();

        let first = client
            .handle_gateway_event(&click("first", "500"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.handlers(), 1);
        while client.0.waiters.lock().await.is_empty() {
            tokio::task::yield_now().await;
        }

        deliver(&client, &click("second", "500")).await;
        first.join().await;

        assert_eq!(next.lock().unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_dispatch_kinds_and_isolation() {
        let (client, _) = client();
        let log = Arc::new(std::sync::Mutex::new(vec![]));

        let push = |name: &'static str, fail: bool| {
            let log = Arc::clone(&log);
            move |_: Arc<Interaction>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(name);
                    if fail {
                        anyhow::bail!("{name} failed");
                    }
                    Ok(())
                }
            }
        };

        client
            .on(EventKind::ButtonClick, push("button_click", false))
            .await;
        client
            .on(EventKind::SelectOption, push("select_option", false))
            .await;
        client
            .on(EventKind::Interaction, push("interaction", true))
            .await;
        client
            .add_callback("ok", explode, None, None)
            .await
            .unwrap();

        let dispatched = client
            .handle_gateway_event(&click("ok", "500"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dispatched.handlers(), 3);

        let int = dispatched.join().await;
        assert_eq!(int.custom_id(), "ok");

        let mut log = log.lock().unwrap().clone();
        log.sort_unstable();
        assert_eq!(log, ["button_click", "interaction"]);
    }

    #[tokio::test]
    async fn test_send_and_reply() {
        let (client, transport) = client();
        let sent = json!({
            "id": "900",
            "channel_id": "300",
            "guild_id": "400",
            "content": "pick",
            "components": [{
                "type": 1,
                "components": [Button::new(ButtonStyle::Primary, "ok", "OK").unwrap().to_wire()],
            }],
        });

        transport.push(Ok(Some(sent.clone())));
        let msg = client
            .send_message(
                ChannelId::new(300),
                MessageBody::plain("pick")
                    .components([Button::new(ButtonStyle::Primary, "ok", "OK").unwrap()])
                    .attach([CreateAttachment::bytes(b"png".as_slice(), "chart.png")]),
            )
            .await
            .unwrap();
        assert_eq!(msg.id(), MessageId::new(900));
        assert!(msg.get_component("ok").is_some());

        transport.push(Ok(Some(sent)));
        client
            .reply(&msg, MessageBody::plain("replying").mention_author(false))
            .await
            .unwrap();

        let reqs = transport.requests();
        assert_eq!(reqs[0].method, Method::Post);
        assert_eq!(reqs[0].route, Route::ChannelMessages {
            channel_id: ChannelId::new(300)
        });
        assert_eq!(reqs[0].files.len(), 1);
        assert_eq!(reqs[0].files[0].filename, "chart.png");
        assert!(reqs[1].files.is_empty());
        assert_eq!(
            reqs[1].body.as_ref().unwrap()["allowed_mentions"]["replied_user"],
            false
        );
        assert_eq!(
            reqs[1].body.as_ref().unwrap()["message_reference"],
            json!({ "message_id": "900", "channel_id": "300", "guild_id": "400" })
        );
    }

    #[tokio::test]
    async fn test_fetch_and_edit() {
        let (client, transport) = client();
        let fetched = json!({ "id": "900", "channel_id": "300", "components": [] });

        transport.push(Ok(Some(fetched.clone())));
        let msg = client
            .fetch_message(ChannelId::new(300), MessageId::new(900))
            .await
            .unwrap();
        assert!(msg.rows().is_empty());

        transport.push(Ok(Some(fetched)));
        client
            .edit_message(
                ChannelId::new(300),
                MessageId::new(900),
                MessageBody::plain("edited"),
            )
            .await
            .unwrap();

        let reqs = transport.requests();
        assert_eq!(reqs[0].method, Method::Get);
        assert_eq!(reqs[1].method, Method::Patch);
        assert_eq!(reqs[1].body, Some(json!({ "content": "edited" })));

        assert!(matches!(
            client
                .fetch_message(ChannelId::new(300), MessageId::new(900))
                .await,
            Err(Error::Protocol(_))
        ));
    }
}
