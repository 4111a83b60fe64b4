//! Boot sequence and the never-ending poll loop.
//!
//! Startup runs `DisplayReady -> Associating -> Associated | AssociationFailed`.
//! Only a display that cannot be driven ends the process. An invalid
//! configuration or a failed association leaves its error screen up and the
//! device idles without entering the loop. Inside the loop every failure is
//! turned into a screen and the loop keeps going.

use anyhow::Context;
use std::time::Duration;
use thiserror::Error;

use crate::color::BACKGROUND;
use crate::config::{AppConfig, ConfigError, NetworkConfig};
use crate::poll::PollState;
use crate::price::{FetchError, FetchOutcome};
use crate::render::{PriceScale, Renderer, Screen, Severity};
use crate::surface::{Clock, DisplaySurface, NetworkLink, PriceClient};

const ASSOCIATION_TICK: Duration = Duration::from_secs(1);
const CONNECTED_HOLD: Duration = Duration::from_secs(1);
const IDLE_TICK: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("display hardware fault: {0}")]
    FatalHardwareFault(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(ConfigError),
    #[error("WiFi association timed out after {0}s")]
    AssociationTimeout(u32),
}

pub struct Controller<D, N, P, C> {
    display: D,
    link: N,
    client: P,
    clock: C,
    renderer: Renderer,
    poll: PollState,
    network: NetworkConfig,
    association_timeout_secs: u32,
    config_error: Option<ConfigError>,
}

impl<D, N, P, C> Controller<D, N, P, C>
where
    D: DisplaySurface,
    N: NetworkLink,
    P: PriceClient,
    C: Clock,
{
    pub fn new(display: D, link: N, client: P, clock: C, renderer: Renderer, config: &AppConfig) -> Self {
        Self {
            display,
            link,
            client,
            clock,
            renderer,
            poll: PollState::new(config.poll.update_interval(), config.poll.poll_interval()),
            network: config.network.clone(),
            association_timeout_secs: config.poll.association_timeout_secs,
            config_error: config.validate().err(),
        }
    }

    /// Bring the display up and join the network.
    ///
    /// On `Ok` the controller is ready for [`run`](Self::run).
    pub fn boot(&mut self) -> Result<(), ControllerError> {
        self.display.clear(BACKGROUND).map_err(|e| {
            log::error!("Display did not accept first draw: {:#}", e);
            ControllerError::FatalHardwareFault(format!("{:#}", e))
        })?;
        log::info!("Display ready");

        if let Some(e) = self.config_error.clone() {
            log::error!("Invalid configuration: {}", e);
            self.show(&Screen::ConfigError);
            return Err(ControllerError::InvalidConfig(e));
        }

        if !self.associate() {
            log::error!("WiFi association failed, not starting price loop");
            self.show(&Screen::AssociationFailed);
            return Err(ControllerError::AssociationTimeout(self.association_timeout_secs));
        }

        let address = self.link.local_address();
        log::info!("WiFi connected: {}", address.as_deref().unwrap_or("<no address>"));
        self.show(&Screen::Connected { address });
        self.clock.sleep(CONNECTED_HOLD);
        Ok(())
    }

    /// Start joining and re-check once per second until associated or the
    /// countdown runs out. A link that is already up is not joined again.
    fn associate(&mut self) -> bool {
        if self.link.is_associated() {
            log::info!("WiFi already associated");
            return true;
        }

        log::info!("Connecting to: {}", self.network.wifi_ssid);
        self.show(&Screen::Connecting);

        if let Err(e) = self.link.start_association(&self.network.wifi_ssid, &self.network.wifi_password) {
            log::warn!("Could not start association: {:#}", e);
        }

        for remaining in (0..self.association_timeout_secs).rev() {
            self.clock.sleep(ASSOCIATION_TICK);
            if self.link.is_associated() {
                return true;
            }
            log::info!("Waiting for WiFi... {}", remaining);
        }
        false
    }

    /// Run the poll loop forever
    pub fn run(mut self) -> ! {
        log::info!(
            "Entering price loop (update every {}s, tick {}s)",
            self.poll.update_interval().as_secs(),
            self.poll.poll_interval().as_secs()
        );
        loop {
            self.iterate();
        }
    }

    /// Park for good after a boot error. The screen boot left up stays lit
    /// because the display and link are never dropped.
    pub fn idle(mut self) -> ! {
        log::warn!("Idling with error screen shown; power-cycle to retry");
        loop {
            self.idle_tick();
        }
    }

    /// One idle pass: sleeps without touching display, link or API
    pub fn idle_tick(&mut self) {
        self.clock.sleep(IDLE_TICK);
    }

    /// One loop pass: fetch and repaint if due, then sleep one tick.
    /// Errors stop at this boundary.
    pub fn iterate(&mut self) {
        if let Err(e) = self.step() {
            log::error!("Loop iteration failed: {:#}", e);
            if let Err(e) = self.renderer.render(&Screen::Fault).paint(&mut self.display) {
                log::error!("Could not show fault screen: {:#}", e);
            }
        }
        self.clock.sleep(self.poll.poll_interval());
    }

    fn step(&mut self) -> anyhow::Result<()> {
        let now = self.clock.now();
        if !self.poll.is_due(now) {
            return Ok(());
        }

        let outcome = self.fetch();
        self.poll.mark_attempt(now);
        log_outcome(&outcome, self.renderer.scale());

        self.renderer
            .render_outcome(&outcome)
            .paint(&mut self.display)
            .context("painting price screen")
    }

    fn fetch(&mut self) -> FetchOutcome {
        if !self.link.is_associated() {
            return Err(FetchError::NetworkUnavailable);
        }
        log::info!("Fetching price...");
        self.client.fetch_current_price()
    }

    /// Best-effort paint for transient screens
    fn show(&mut self, screen: &Screen) {
        if let Err(e) = self.renderer.render(screen).paint(&mut self.display) {
            log::warn!("Could not draw {:?} screen: {:#}", screen, e);
        }
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn link(&self) -> &N {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut N {
        &mut self.link
    }

    pub fn client(&self) -> &P {
        &self.client
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn log_outcome(outcome: &FetchOutcome, scale: &PriceScale) {
    match outcome {
        Ok(price) => {
            let minor = price.minor_units();
            log::info!(
                "Price: {:.4}/kWh ({} minor, {:?}) from {}",
                price.total(),
                minor,
                Severity::classify(minor, scale),
                price.starts_at()
            );
        }
        Err(FetchError::NetworkUnavailable) => log::warn!("Price skipped: WiFi not associated"),
        Err(FetchError::ApiError(message)) => log::warn!("Price API error: {}", message),
        Err(FetchError::MalformedResponse) => log::warn!("Price response missing expected fields"),
    }
}
