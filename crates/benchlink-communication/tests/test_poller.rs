use benchlink_communication::{
    channels, ConnectionManager, ConnectionParams, PollerConfig, TelemetryPoller, Transport,
};
use benchlink_core::{ConnectionError, LinkEvent, Sample, SampleSink, StatusKind};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedTransport {
    rx: Arc<Mutex<VecDeque<Vec<u8>>>>,
    connected: bool,
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, _params: &ConnectionParams) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        Ok(data.len())
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.rx.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

fn connected_manager() -> (Arc<ConnectionManager>, Arc<Mutex<VecDeque<Vec<u8>>>>) {
    let rx = Arc::new(Mutex::new(VecDeque::new()));
    let manager = Arc::new(ConnectionManager::new(Box::new(ScriptedTransport {
        rx: rx.clone(),
        connected: false,
    })));
    let params = ConnectionParams {
        port: "/dev/ttyTEST".to_string(),
        baud_rate: 57600,
        timeout_ms: 10,
        settle_delay_ms: 0,
    };
    manager.connect(&params).unwrap();
    (manager, rx)
}

fn fast_config() -> PollerConfig {
    PollerConfig {
        interval_ms: 10,
        window_s: 10.0,
    }
}

fn push(rx: &Arc<Mutex<VecDeque<Vec<u8>>>>, chunk: &str) {
    rx.lock().unwrap().push_back(chunk.as_bytes().to_vec());
}

struct CollectingSink {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl SampleSink for CollectingSink {
    fn on_sample(&self, sample: &Sample) {
        self.samples.lock().unwrap().push(sample.clone());
    }
}

#[tokio::test]
async fn samples_land_in_buffers_in_wire_order() {
    let (manager, rx) = connected_manager();
    let mut poller = TelemetryPoller::start(manager.clone(), fast_config());

    // Two frames in one chunk must be buffered in arrival order.
    push(
        &rx,
        "Throttle:20.0,Thrust:40.0,RPM:3000,Current:1.0,AmbientTemp:24.0,ObjectTemp:30.0\n\
         Throttle:50.0,Thrust:120.5,RPM:8000,Current:3.25,AmbientTemp:25.0,ObjectTemp:40.2\n",
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    let thrust = poller.series(channels::THRUST);
    assert_eq!(thrust.len(), 2);
    assert_eq!(thrust[0].v, 40.0);
    assert_eq!(thrust[1].v, 120.5);

    let throttle = poller.series(channels::THROTTLE);
    assert_eq!(throttle.len(), 2);
    assert_eq!(throttle[0].v, 20.0);
    assert_eq!(throttle[1].v, 50.0);

    assert_eq!(poller.latest(channels::RPM).unwrap().v, 8000.0);
    poller.stop();
}

#[tokio::test]
async fn status_events_drive_the_session_timer() {
    let (manager, rx) = connected_manager();
    let mut poller = TelemetryPoller::start(manager.clone(), fast_config());
    assert!(!poller.session_running());

    push(&rx, "Motor speed adjusted to 70%\n");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(poller.session_running());

    push(&rx, "Motor stopped\n");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!poller.session_running());
    poller.stop();
}

#[tokio::test]
async fn events_are_published_for_every_decoded_line() {
    let (manager, rx) = connected_manager();
    let mut events = manager.subscribe();
    let mut poller = TelemetryPoller::start(manager.clone(), fast_config());

    push(
        &rx,
        "Throttle:50.0,Thrust:120.5,RPM:8000,Current:3.25,AmbientTemp:25.0,ObjectTemp:40.2\n\
         Motor stopped\n\
         ***garbage***\n",
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut saw_sample = false;
    let mut saw_status = false;
    let mut saw_unknown = false;
    while let Ok(event) = events.try_recv() {
        match event {
            LinkEvent::Sample(sample) => {
                assert_eq!(sample.thrust_g, Some(120.5));
                saw_sample = true;
            }
            LinkEvent::Status(status) => {
                assert_eq!(status.kind, StatusKind::MotorStopped);
                saw_status = true;
            }
            LinkEvent::UnknownFrame { raw, .. } => {
                assert_eq!(raw, "***garbage***");
                saw_unknown = true;
            }
            _ => {}
        }
    }
    assert!(saw_sample && saw_status && saw_unknown);
    poller.stop();
}

#[tokio::test]
async fn registered_sinks_receive_accepted_samples_only() {
    let (manager, rx) = connected_manager();
    let mut poller = TelemetryPoller::start(manager.clone(), fast_config());

    let samples = Arc::new(Mutex::new(Vec::new()));
    let handle = poller.register_sink(Arc::new(CollectingSink {
        samples: samples.clone(),
    }));
    assert_eq!(poller.sink_count(), 1);

    push(
        &rx,
        "***garbage***\n\
         Throttle:50.0,Thrust:120.5,RPM:8000,Current:3.25,AmbientTemp:25.0,ObjectTemp:40.2\n",
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    {
        let seen = samples.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].rpm, Some(8000));
    }

    poller.unregister_sink(handle);
    assert_eq!(poller.sink_count(), 0);
    poller.stop();
}

#[tokio::test]
async fn clear_buffers_resets_series_for_reconnect() {
    let (manager, rx) = connected_manager();
    let mut poller = TelemetryPoller::start(manager.clone(), fast_config());

    push(
        &rx,
        "Throttle:50.0,Thrust:120.5,RPM:8000,Current:3.25,AmbientTemp:25.0,ObjectTemp:40.2\n",
    );
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(poller.series(channels::THRUST).len(), 1);

    poller.clear_buffers();
    assert!(poller.series(channels::THRUST).is_empty());

    // Channels stay registered; new samples are accepted after the clear.
    push(
        &rx,
        "Throttle:60.0,Thrust:150.0,RPM:9000,Current:4.0,AmbientTemp:25.0,ObjectTemp:41.0\n",
    );
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(poller.series(channels::THRUST).len(), 1);
    poller.stop();
}

#[tokio::test]
async fn session_timer_persists_across_reconnects() {
    let (manager, rx) = connected_manager();
    let mut poller = TelemetryPoller::start(manager.clone(), fast_config());

    push(&rx, "Motor speed adjusted to 50%\n");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(poller.session_running());

    manager.disconnect();
    assert!(poller.session_running());

    poller.session_stop();
    let frozen = poller.session_elapsed();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(poller.session_elapsed(), frozen);
    poller.stop();
}
