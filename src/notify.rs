//! Single-subscriber notification channels
//!
//! Two independent channels exist: a plain one whose handler receives an
//! integer cookie, and a complex one whose handler also receives a string and
//! an array cookie. Each channel holds at most one subscription.
//!
//! Registration hands out a token. Removing a subscription requires that exact
//! token and advances the channel's token by 2, so a stale token from an
//! earlier subscription can never remove a later one.

use std::fmt;

/// Handler for the plain channel; its captures play the role of the context
pub type EchoHandler = Box<dyn FnMut(i32)>;

/// Handler for the complex channel: `(cookie, cookie_string, cookie_array)`
pub type EchoComplexHandler = Box<dyn FnMut(i32, &str, &[i16])>;

/// Token for a plain-channel subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoHandlerRef(usize);

/// Token for a complex-channel subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoComplexHandlerRef(usize);

const FIRST_TOKEN: usize = 1;
const TOKEN_STRIDE: usize = 2;

enum Slot<H> {
    Empty,
    Subscribed { handler: H, token: usize },
}

struct Channel<H> {
    name: &'static str,
    slot: Slot<H>,
    next_token: usize,
}

impl<H> Channel<H> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Slot::Empty,
            next_token: FIRST_TOKEN,
        }
    }

    fn register(&mut self, handler: H) -> Option<usize> {
        if let Slot::Subscribed { token, .. } = self.slot {
            tracing::debug!(channel = self.name, live = token, "channel already subscribed");
            return None;
        }

        let token = self.next_token;
        self.slot = Slot::Subscribed { handler, token };
        tracing::debug!(channel = self.name, token, "handler registered");
        Some(token)
    }

    fn unregister(&mut self, token: usize) {
        match self.slot {
            Slot::Subscribed { token: live, .. } if live == token => {
                self.slot = Slot::Empty;
                self.next_token += TOKEN_STRIDE;
                tracing::debug!(channel = self.name, token, "handler removed");
            }
            _ => {
                tracing::debug!(channel = self.name, token, "ignoring stale handler token");
            }
        }
    }

    fn handler_mut(&mut self) -> Option<&mut H> {
        match &mut self.slot {
            Slot::Subscribed { handler, .. } => Some(handler),
            Slot::Empty => None,
        }
    }

    fn is_subscribed(&self) -> bool {
        matches!(self.slot, Slot::Subscribed { .. })
    }
}

/// Subscription store for both notification channels
pub struct NotificationRegistry {
    echo: Channel<EchoHandler>,
    complex: Channel<EchoComplexHandler>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self {
            echo: Channel::new("echo"),
            complex: Channel::new("echo_complex"),
        }
    }

    /// Subscribe to the plain channel
    ///
    /// Returns `None` if the channel already has a subscriber.
    pub fn add_echo_handler(
        &mut self,
        handler: impl FnMut(i32) + 'static,
    ) -> Option<EchoHandlerRef> {
        self.echo.register(Box::new(handler)).map(EchoHandlerRef)
    }

    /// Remove the plain-channel subscription if `handler_ref` is the live one
    pub fn remove_echo_handler(&mut self, handler_ref: EchoHandlerRef) {
        self.echo.unregister(handler_ref.0);
    }

    /// Invoke the plain-channel handler, if any; returns whether one ran
    pub fn fire_echo(&mut self, cookie: i32) -> bool {
        match self.echo.handler_mut() {
            Some(handler) => {
                tracing::debug!(cookie, "firing echo event");
                handler(cookie);
                true
            }
            None => false,
        }
    }

    /// Subscribe to the complex channel
    ///
    /// Returns `None` if the channel already has a subscriber.
    pub fn add_echo_complex_handler(
        &mut self,
        handler: impl FnMut(i32, &str, &[i16]) + 'static,
    ) -> Option<EchoComplexHandlerRef> {
        self.complex
            .register(Box::new(handler))
            .map(EchoComplexHandlerRef)
    }

    /// Remove the complex-channel subscription if `handler_ref` is the live one
    pub fn remove_echo_complex_handler(&mut self, handler_ref: EchoComplexHandlerRef) {
        self.complex.unregister(handler_ref.0);
    }

    /// Invoke the complex-channel handler, if any; returns whether one ran
    pub fn fire_echo_complex(
        &mut self,
        cookie: i32,
        cookie_string: &str,
        cookie_array: &[i16],
    ) -> bool {
        match self.complex.handler_mut() {
            Some(handler) => {
                tracing::debug!(
                    cookie,
                    cookie_string,
                    len = cookie_array.len(),
                    "firing complex event"
                );
                handler(cookie, cookie_string, cookie_array);
                true
            }
            None => false,
        }
    }

    pub fn has_echo_handler(&self) -> bool {
        self.echo.is_subscribed()
    }

    pub fn has_echo_complex_handler(&self) -> bool {
        self.complex.is_subscribed()
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRegistry")
            .field("echo", &self.echo.is_subscribed())
            .field("complex", &self.complex.is_subscribed())
            .finish()
    }
}
