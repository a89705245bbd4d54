// A driver for MagicHome Wi-Fi LED controllers. These controllers
// accept short binary frames over a TCP connection (port 5577). See
// the `wire` module for the frame layouts.
//
// Each device is managed by one task which owns the light's state,
// the connection and any running effect. Clients talk to the task
// through a `Handle`. Requests are handled one at a time, in the order
// they were sent, so a frame can never overtake one that was
// requested before it.

use futures::future;
use magichome_api::{
    effect::{Effect, Step},
    encoder::{self, Thresholds},
    profile::Family,
    sync, LightState, Result, Transport,
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{self, Duration, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, info_span, warn, Instrument};

pub mod config;
mod tcp;
pub mod wire;

pub use config::Params;
pub use tcp::TcpTransport;

/// The changes a host can ask of a light.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Intent {
    Power(bool),
    Hue(u16),
    Saturation(u8),
    Brightness(u8),
    Luminance(u8),
    Identify,
    Rainbow,
    Pattern { pattern: u8, speed: u8 },
}

type Reply<T> = oneshot::Sender<Result<T>>;

// Requests sent from a `Handle` to the device's task.

enum Request {
    Apply(Intent, Reply<()>),
    GetState(oneshot::Sender<LightState>),
    Refresh(Reply<LightState>),
    Settle(oneshot::Sender<()>),
}

/// A cloneable handle used to control one light.

#[derive(Clone)]
pub struct Handle {
    tx: mpsc::Sender<Request>,
    state: watch::Receiver<LightState>,
}

impl Handle {
    /// Sends an intent to the light. Returns once the resulting frame
    /// was written (or, for effects, once the effect has started.)

    pub async fn apply(&self, intent: Intent) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        self.tx.send(Request::Apply(intent, tx)).await?;
        rx.await?
    }

    pub async fn set_on(&self, on: bool) -> Result<()> {
        self.apply(Intent::Power(on)).await
    }

    pub async fn set_hue(&self, hue: u16) -> Result<()> {
        self.apply(Intent::Hue(hue)).await
    }

    pub async fn set_saturation(&self, saturation: u8) -> Result<()> {
        self.apply(Intent::Saturation(saturation)).await
    }

    pub async fn set_brightness(&self, brightness: u8) -> Result<()> {
        self.apply(Intent::Brightness(brightness)).await
    }

    pub async fn set_luminance(&self, luminance: u8) -> Result<()> {
        self.apply(Intent::Luminance(luminance)).await
    }

    pub async fn identify(&self) -> Result<()> {
        self.apply(Intent::Identify).await
    }

    pub async fn rainbow(&self) -> Result<()> {
        self.apply(Intent::Rainbow).await
    }

    pub async fn set_pattern(&self, pattern: u8, speed: u8) -> Result<()> {
        self.apply(Intent::Pattern { pattern, speed }).await
    }

    /// Returns the state as the controller currently understands it.

    pub async fn state(&self) -> Result<LightState> {
        let (tx, rx) = oneshot::channel();

        self.tx.send(Request::GetState(tx)).await?;
        Ok(rx.await?)
    }

    /// Reads the device and returns the updated state. While an effect
    /// runs, the device isn't read and the cached state is returned.

    pub async fn refresh(&self) -> Result<LightState> {
        let (tx, rx) = oneshot::channel();

        self.tx.send(Request::Refresh(tx)).await?;
        rx.await?
    }

    /// Waits until no effect is running.

    pub async fn settle(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        self.tx.send(Request::Settle(tx)).await?;
        Ok(rx.await?)
    }

    /// Returns a receiver which sees every change to the light's
    /// state, whether it came from an intent, an effect or a poll.

    pub fn subscribe(&self) -> watch::Receiver<LightState> {
        self.state.clone()
    }
}

// An effect in progress along with the timer that paces it.

struct Running {
    effect: Effect,
    timer: Interval,
}

pub struct Instance<T: Transport> {
    name: Arc<str>,
    peer: Arc<str>,
    family: Family,
    thresholds: Thresholds,
    transport: T,
    state: LightState,
    poll_interval: Duration,
    timeout: Duration,
    effect: Option<Running>,
    waiters: Vec<oneshot::Sender<()>>,
    tx_state: watch::Sender<LightState>,
}

impl<T: Transport + 'static> Instance<T> {
    /// Creates a controller. `peer` describes where the device lives
    /// and is only used in log messages.

    pub fn new(
        name: &str,
        peer: &str,
        family: Family,
        thresholds: Thresholds,
        transport: T,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        let state = LightState::default();

        Instance {
            name: name.into(),
            peer: peer.into(),
            family,
            thresholds,
            transport,
            state,
            poll_interval,
            timeout,
            effect: None,
            waiters: vec![],
            tx_state: watch::Sender::new(state),
        }
    }

    /// Spawns the task that manages the light and returns a handle to
    /// it. The task exits once every handle has been dropped.

    pub fn start(self) -> (Handle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(32);
        let handle = Handle {
            tx,
            state: self.tx_state.subscribe(),
        };
        let span = info_span!("light", name = &*self.name, addr = &*self.peer);

        (handle, tokio::spawn(self.run(rx).instrument(span)))
    }

    // Pushes the current state to subscribers, if it changed.

    fn publish(&self) {
        let state = self.state;

        self.tx_state.send_if_modified(|current| {
            if *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
    }

    async fn send(&mut self, cmd: &[u8]) -> Result<()> {
        match self.transport.send(cmd, true).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("couldn't send {:02x?} : {}", cmd, &e);
                Err(e)
            }
        }
    }

    async fn send_color(&mut self) -> Result<()> {
        let cmd = encoder::encode(&self.state, self.family, &self.thresholds);

        self.send(cmd.as_bytes()).await
    }

    async fn sync(&mut self) -> Result<()> {
        let obs =
            sync::read_state(&mut self.transport, &mut self.state, self.timeout)
                .await?;

        debug!(
            "device reports on:{} h:{} s:{}",
            obs.on, obs.hue, obs.saturation
        );
        self.publish();
        Ok(())
    }

    // Stops the running effect, if any. The light is put in its idle
    // state so it isn't left dark or tinted by the effect; no frame is
    // sent since the caller is about to send its own.

    fn cancel_effect(&mut self) {
        if let Some(running) = self.effect.take() {
            info!("cancelling {:?} effect", running.effect.kind());
            self.state.go_idle();
            self.wake_waiters();
        }
    }

    fn start_effect(&mut self, effect: Effect) {
        let period = effect.period();

        let mut timer = time::interval_at(Instant::now() + period, period);

        // A slow send mustn't cause a burst of catch-up ticks.

        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("starting {:?} effect", effect.kind());
        self.effect = Some(Running { effect, timer });
    }

    fn wake_waiters(&mut self) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    // Resolves when the running effect's next tick is due. Never
    // resolves if no effect is running.

    async fn next_tick(effect: &mut Option<Running>) {
        match effect {
            Some(running) => {
                running.timer.tick().await;
            }
            None => future::pending().await,
        }
    }

    async fn step_effect(&mut self) {
        let step = match self.effect.as_mut() {
            Some(running) => running.effect.tick(&mut self.state),
            None => return,
        };

        let _ = self.send_color().await;
        self.publish();

        if step == Step::Done {
            debug!("effect finished");
            self.effect = None;
            self.wake_waiters();
        }
    }

    async fn apply(&mut self, intent: Intent) -> Result<()> {
        debug!("intent -> {:?}", &intent);
        self.cancel_effect();

        match intent {
            Intent::Power(on) => {
                self.state.on = on;
                self.send(&wire::power_cmd(on)).await
            }
            Intent::Hue(v) => {
                self.state.hue = v;
                self.send_color().await
            }
            Intent::Saturation(v) => {
                self.state.saturation = v;
                self.send_color().await
            }
            Intent::Brightness(v) => {
                self.state.brightness = v;
                self.send_color().await
            }
            Intent::Luminance(v) => {
                self.state.luminance = v;
                self.send_color().await
            }
            Intent::Identify => {
                let effect = Effect::identify(&mut self.state);

                self.start_effect(effect);
                Ok(())
            }
            Intent::Rainbow => {
                let effect = Effect::rainbow(&mut self.state);

                self.start_effect(effect);
                Ok(())
            }
            Intent::Pattern { pattern, speed } => {
                self.send(&wire::pattern_cmd(pattern, speed)).await
            }
        }
    }

    async fn handle_request(&mut self, req: Request) {
        match req {
            Request::Apply(intent, rpy) => {
                let result = self.apply(intent).await;

                self.publish();
                let _ = rpy.send(result);
            }

            Request::GetState(rpy) => {
                let _ = rpy.send(self.state);
            }

            Request::Refresh(rpy) => {
                let result = if self.effect.is_none() {
                    self.sync().await.map(|_| self.state)
                } else {
                    Ok(self.state)
                };

                let _ = rpy.send(result);
            }

            Request::Settle(rpy) => {
                if self.effect.is_none() {
                    let _ = rpy.send(());
                } else {
                    self.waiters.push(rpy)
                }
            }
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        if !self.family.is_known() {
            warn!("{} : driving it as an RGB controller", self.family);
        } else {
            info!("driving {} controller", self.family);
        }

        // Start from what the device is showing. Otherwise the first
        // intent would be encoded against the default state and
        // change the parts of the color it didn't ask to change.

        let _ = self.sync().await;

        // Devices can be changed by other apps, so the state is polled
        // periodically. Polls are skipped while an effect is running
        // so they don't undo it.

        let mut poll = time::interval_at(
            Instant::now() + self.poll_interval,
            self.poll_interval,
        );

        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            #[rustfmt::skip]
            tokio::select! {
                _ = poll.tick(), if self.effect.is_none() => {
                    let _ = self.sync().await;
                }

                _ = Instance::<T>::next_tick(&mut self.effect),
                    if self.effect.is_some() => {
                    self.step_effect().await
                }

                req = rx.recv() => {
                    match req {
                        Some(req) => self.handle_request(req).await,
                        None => break
                    }
                }
            }
        }

        // All handles are gone. Let any running effect finish so the
        // light isn't left mid-animation.

        while self.effect.is_some() {
            Instance::<T>::next_tick(&mut self.effect).await;
            self.step_effect().await
        }
        info!("no more handles; exiting")
    }
}

/// Starts a controller for a device reached over TCP, as described by
/// its configuration.

pub fn start(
    name: &str,
    params: &Params,
    thresholds: Thresholds,
) -> (Handle, JoinHandle<()>) {
    Instance::new(
        name,
        &params.addr.to_string(),
        params.family(),
        thresholds,
        TcpTransport::new(params.addr),
        params.poll_interval(),
        params.timeout(),
    )
    .start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use magichome_api::{encoder::Mask, DeviceState, Error, Rgb};
    use std::sync::Mutex;

    // Records every frame sent to it. State queries return `reply`,
    // or a timeout if there is none.

    #[derive(Default)]
    struct Shared {
        frames: Vec<Vec<u8>>,
        sent_at: Vec<Instant>,
        reply: Option<DeviceState>,
        fail_sends: bool,
        slow_sends: usize,
    }

    #[derive(Clone, Default)]
    struct Mock(Arc<Mutex<Shared>>);

    impl Mock {
        fn frames(&self) -> Vec<Vec<u8>> {
            self.0.lock().unwrap().frames.clone()
        }

        fn set_reply(&self, reply: Option<DeviceState>) {
            self.0.lock().unwrap().reply = reply
        }

        fn fail_sends(&self, fail: bool) {
            self.0.lock().unwrap().fail_sends = fail
        }

        // The next `n` sends each take a second to complete.

        fn slow_sends(&self, n: usize) {
            self.0.lock().unwrap().slow_sends = n
        }

        fn sent_at(&self) -> Vec<Instant> {
            self.0.lock().unwrap().sent_at.clone()
        }
    }

    #[async_trait]
    impl Transport for Mock {
        async fn get_state(&mut self, _: Duration) -> Result<DeviceState> {
            self.0.lock().unwrap().reply.clone().ok_or(Error::TimeoutError)
        }

        async fn send(&mut self, cmd: &[u8], use_checksum: bool) -> Result<()> {
            let slow = {
                let mut shared = self.0.lock().unwrap();

                assert!(use_checksum);
                if shared.fail_sends {
                    return Err(Error::MissingPeer("mock".into()));
                }
                shared.frames.push(cmd.to_vec());
                shared.sent_at.push(Instant::now());
                if shared.slow_sends > 0 {
                    shared.slow_sends -= 1;
                    true
                } else {
                    false
                }
            };

            if slow {
                time::sleep(Duration::from_secs(1)).await
            }
            Ok(())
        }
    }

    fn mk_instance(version: u8) -> (Mock, Handle, JoinHandle<()>) {
        mk_instance_with(version, Mock::default())
    }

    fn mk_instance_with(
        version: u8,
        mock: Mock,
    ) -> (Mock, Handle, JoinHandle<()>) {
        let (handle, task) = Instance::new(
            "test",
            "mock",
            Family::from_version(version),
            Thresholds::default(),
            mock.clone(),
            Duration::from_secs(3_600),
            Duration::from_millis(100),
        )
        .start();

        (mock, handle, task)
    }

    #[tokio::test]
    async fn test_intents_are_ordered() {
        let (mock, handle, _) = mk_instance(4);

        handle.set_on(false).await.unwrap();
        handle.set_hue(0).await.unwrap();
        handle.set_saturation(100).await.unwrap();
        handle.set_brightness(40).await.unwrap();
        handle.set_pattern(0x25, 100).await.unwrap();

        let frames = mock.frames();

        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0], vec![0x71, 0x24, 0x0f]);
        assert_eq!(frames[2], vec![0x31, 255, 0, 0, 0x00, 0xF0, 0x0F]);
        assert_eq!(frames[3], vec![0x31, 102, 0, 0, 0x00, 0xF0, 0x0F]);
        assert_eq!(frames[4], vec![0x61, 0x25, 1, 0x0f]);

        let state = handle.state().await.unwrap();

        assert!(!state.on);
        assert_eq!((state.hue, state.saturation, state.brightness), (0, 100, 40));
    }

    #[tokio::test]
    async fn test_concurrent_handles() {
        let (mock, handle, _) = mk_instance(7);
        let other = handle.clone();

        // Both clients finish before we look, and each request
        // produced exactly one frame.

        let (a, b) = tokio::join!(handle.set_hue(120), other.set_brightness(10));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(mock.frames().len(), 2);
        assert!(mock.frames().iter().all(|f| f.len() == 8));
    }

    #[tokio::test]
    async fn test_subscribe() {
        let (_mock, handle, _) = mk_instance(4);
        let mut rx = handle.subscribe();

        rx.borrow_and_update();
        handle.set_hue(42).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().hue, 42);

        // Repeating a value isn't a change.

        handle.set_hue(42).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_refresh() {
        let (mock, handle, _) = mk_instance(4);

        handle.set_brightness(30).await.unwrap();

        // With no reply, the refresh fails and the state is kept.

        let before = handle.state().await.unwrap();

        assert_eq!(handle.refresh().await, Err(Error::TimeoutError));
        assert_eq!(handle.state().await.unwrap(), before);

        mock.set_reply(Some(DeviceState {
            is_on: false,
            color: Rgb {
                red: 0,
                green: 255,
                blue: 0,
            },
            ..DeviceState::default()
        }));

        let state = handle.refresh().await.unwrap();

        assert!(!state.on);
        assert_eq!((state.hue, state.saturation), (120, 100));
        assert_eq!(state.brightness, 30);
    }

    #[tokio::test]
    async fn test_send_failure() {
        let (mock, handle, _) = mk_instance(4);

        mock.fail_sends(true);
        assert!(matches!(
            handle.set_hue(10).await,
            Err(Error::MissingPeer(_))
        ));

        // The controller keeps going and recovers once the device
        // is reachable.

        mock.fail_sends(false);
        handle.set_hue(20).await.unwrap();
        assert_eq!(mock.frames().len(), 1);
        assert_eq!(handle.state().await.unwrap().hue, 20);
    }

    #[tokio::test]
    async fn test_starts_from_device_state() {
        let mock = Mock::default();

        // The light is green when the controller starts. Changing the
        // brightness must keep it green.

        mock.set_reply(Some(DeviceState {
            is_on: true,
            color: Rgb {
                red: 0,
                green: 255,
                blue: 0,
            },
            ..DeviceState::default()
        }));

        let (mock, handle, _) = mk_instance_with(4, mock);

        handle.set_brightness(40).await.unwrap();
        assert_eq!(
            mock.frames(),
            vec![vec![0x31, 0, 102, 0, 0x00, 0xF0, 0x0F]]
        );

        let state = handle.state().await.unwrap();

        assert_eq!((state.hue, state.saturation), (120, 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_send_doesnt_burst() {
        let (mock, handle, _) = mk_instance(4);

        // Only the first frame of the flash is slow. The ticks it
        // delayed must not be replayed back-to-back afterwards.

        mock.slow_sends(1);
        handle.identify().await.unwrap();
        handle.settle().await.unwrap();

        let times = mock.sent_at();

        assert_eq!(times.len(), 10);
        for pair in times[1..].windows(2) {
            assert!(pair[1] - pair[0] >= Effect::IDENTIFY_PERIOD);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_identify() {
        let (mock, handle, _) = mk_instance(7);
        let start = Instant::now();

        handle.identify().await.unwrap();
        handle.settle().await.unwrap();

        assert!(start.elapsed() >= Effect::IDENTIFY_PERIOD * 10);
        assert!(start.elapsed() < Effect::IDENTIFY_PERIOD * 11);

        let frames = mock.frames();

        assert_eq!(frames.len(), 10);

        // Odd ticks turn the light off, even ticks turn it back on.

        assert_eq!(&frames[0][1..6], &[0, 0, 0, 0, 0]);
        assert_ne!(frames[1][1..4], [0, 0, 0]);

        // The last frame restores the idle state: low saturation,
        // which this device renders with its white LEDs.

        assert_eq!(frames[9][6], Mask::White as u8);

        let state = handle.state().await.unwrap();

        assert_eq!((state.hue, state.saturation, state.brightness), (0, 5, 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rainbow() {
        let (mock, handle, _) = mk_instance(4);

        handle.rainbow().await.unwrap();
        handle.settle().await.unwrap();

        let frames = mock.frames();

        assert_eq!(frames.len(), 37);
        assert_eq!(frames[0], vec![0x31, 255, 0, 0, 0x00, 0xF0, 0x0F]);
        assert_eq!(frames[12], vec![0x31, 0, 255, 0, 0x00, 0xF0, 0x0F]);
        assert_eq!(frames[24], vec![0x31, 0, 0, 255, 0x00, 0xF0, 0x0F]);
        assert!(handle.state().await.unwrap().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_intent_cancels_effect() {
        let (mock, handle, _) = mk_instance(4);

        handle.identify().await.unwrap();
        handle.set_hue(200).await.unwrap();
        handle.settle().await.unwrap();

        // The effect never got to tick; only the intent's frame went
        // out, and the effect's dimming was undone.

        let frames = mock.frames();

        assert_eq!(frames.len(), 1);

        let state = handle.state().await.unwrap();

        assert_eq!((state.hue, state.brightness), (200, 100));

        // Let time pass to make sure no stale effect ticks fire.

        time::sleep(Effect::IDENTIFY_PERIOD * 20).await;
        assert_eq!(mock.frames().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_effect_replaces_effect() {
        let (mock, handle, _) = mk_instance(4);

        handle.rainbow().await.unwrap();
        handle.identify().await.unwrap();
        handle.settle().await.unwrap();

        assert_eq!(mock.frames().len(), 10);
        assert!(handle.state().await.unwrap().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_finishes_effect() {
        let (mock, handle, task) = mk_instance(4);

        handle.identify().await.unwrap();
        drop(handle);
        task.await.unwrap();
        assert_eq!(mock.frames().len(), 10);
    }
}
