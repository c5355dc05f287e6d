//! Drives the operator loop against a scripted event source.

use std::{
    io,
    sync::{
        atomic::{AtomicU32, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy::{primitives::Bytes, transports::TransportErrorKind};
use async_trait::async_trait;
use avs_chainio::{
    ChainEventSource, ChainIoError, MockChainEventSource, SubscriptionError, TaskFeed,
    TaskSubscription,
};
use avs_common::{shutdown_channel, ShutdownTrigger};
use avs_operator::{
    verify_signature, BlsKeyPair, LoopStats, MockResponseSink, OperatorError, OperatorIdentity,
    OperatorLoop, ReconnectPolicy, ResponseSigner, SinkError, TaskProcessor,
};
use avs_primitives::{ProvingSystemId, SignedResponse, Task};
use avs_verifier::{ProofVerifier, VerifierError, VerifierRegistry};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep, timeout, Instant},
};
use tracing_subscriber::fmt::MakeWriter;

const WAIT: Duration = Duration::from_secs(5);

/// Accepts the proof `b"valid"`, rejects anything else, and treats the key `b"bad"` as
/// unparseable.
struct ByteVerifier;

impl ProofVerifier for ByteVerifier {
    fn proving_system(&self) -> ProvingSystemId {
        ProvingSystemId::PlonkBls12_381
    }

    fn verify(&self, proof: &[u8], _: &[u8], vk: &[u8]) -> Result<bool, VerifierError> {
        if vk == b"bad" {
            return Err(VerifierError::MalformedVerificationKey("bad".to_owned()));
        }
        Ok(proof == b"valid")
    }
}

/// Verifies like [`ByteVerifier`], but reports each call and then blocks until released.
struct GatedVerifier {
    started: mpsc::UnboundedSender<u32>,
    release: Mutex<mpsc::UnboundedReceiver<()>>,
}

struct Gate {
    started: mpsc::UnboundedReceiver<u32>,
    release: mpsc::UnboundedSender<()>,
}

impl GatedVerifier {
    fn new() -> (Arc<Self>, Gate) {
        let (started_tx, started) = mpsc::unbounded_channel();
        let (release, release_rx) = mpsc::unbounded_channel();
        let verifier = Self {
            started: started_tx,
            release: Mutex::new(release_rx),
        };
        (Arc::new(verifier), Gate { started, release })
    }
}

impl ProofVerifier for GatedVerifier {
    fn proving_system(&self) -> ProvingSystemId {
        ProvingSystemId::PlonkBls12_381
    }

    fn verify(&self, proof: &[u8], public_input: &[u8], vk: &[u8]) -> Result<bool, VerifierError> {
        // public input carries the task index
        let index = public_input.first().copied().unwrap_or_default();
        let _ = self.started.send(u32::from(index));
        let _ = self.release.lock().unwrap().blocking_recv();
        ByteVerifier.verify(proof, public_input, vk)
    }
}

impl Gate {
    async fn wait_started(&mut self) -> u32 {
        timeout(WAIT, self.started.recv())
            .await
            .expect("verifier not called")
            .expect("verifier dropped")
    }

    fn release(&self) {
        self.release.send(()).unwrap();
    }
}

/// Hands the feed of every new subscription to the test. The next `fail_subscribes` calls
/// fail instead.
struct ScriptedSource {
    feeds: mpsc::UnboundedSender<TaskFeed>,
    subscribes: Arc<AtomicUsize>,
    fail_subscribes: Arc<AtomicU32>,
}

#[async_trait]
impl ChainEventSource for ScriptedSource {
    async fn subscribe(&self) -> Result<TaskSubscription, ChainIoError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .fail_subscribes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(ChainIoError::Subscribe(TransportErrorKind::backend_gone()));
        }

        let (feed, sub) = TaskSubscription::channel(8);
        let _ = self.feeds.send(feed);
        Ok(sub)
    }
}

struct Harness {
    feeds: mpsc::UnboundedReceiver<TaskFeed>,
    responses: mpsc::Receiver<SignedResponse>,
    subscribes: Arc<AtomicUsize>,
    fail_subscribes: Arc<AtomicU32>,
    trigger: ShutdownTrigger,
    handle: JoinHandle<Result<LoopStats, OperatorError>>,
}

impl Harness {
    fn start() -> Self {
        Self::start_with(ReconnectPolicy::Immediate, Arc::new(ByteVerifier))
    }

    fn start_with(policy: ReconnectPolicy, verifier: Arc<dyn ProofVerifier>) -> Self {
        let (feed_tx, feeds) = mpsc::unbounded_channel();
        let (response_tx, responses) = mpsc::channel(32);
        let subscribes = Arc::new(AtomicUsize::new(0));
        let fail_subscribes = Arc::new(AtomicU32::new(0));
        let source = ScriptedSource {
            feeds: feed_tx,
            subscribes: subscribes.clone(),
            fail_subscribes: fail_subscribes.clone(),
        };

        let (trigger, signal) = shutdown_channel();
        let operator = OperatorLoop::new(source, processor_with(verifier), response_tx, policy);
        let handle = tokio::spawn(operator.run(signal));

        Self {
            feeds,
            responses,
            subscribes,
            fail_subscribes,
            trigger,
            handle,
        }
    }

    async fn next_feed(&mut self) -> TaskFeed {
        timeout(WAIT, self.feeds.recv())
            .await
            .expect("no subscription")
            .expect("source dropped")
    }

    async fn next_response(&mut self) -> SignedResponse {
        timeout(WAIT, self.responses.recv())
            .await
            .expect("no response")
            .expect("sink dropped")
    }

    async fn assert_no_response(&mut self) {
        assert!(timeout(Duration::from_millis(100), self.responses.recv())
            .await
            .is_err());
    }

    async fn stop(self) -> LoopStats {
        self.trigger.trigger();
        self.join().await
    }

    async fn join(self) -> LoopStats {
        timeout(WAIT, self.handle)
            .await
            .expect("loop did not stop")
            .expect("loop panicked")
            .expect("loop failed")
    }
}

fn identity() -> OperatorIdentity {
    let bls = BlsKeyPair::from_secret_bytes(&[42u8; 32]).unwrap();
    let ecdsa = OperatorIdentity::ecdsa_signer_from_bytes(&[2u8; 32]).unwrap();
    OperatorIdentity::new(bls, ecdsa, None).unwrap()
}

fn processor() -> TaskProcessor {
    processor_with(Arc::new(ByteVerifier))
}

fn processor_with(verifier: Arc<dyn ProofVerifier>) -> TaskProcessor {
    let mut registry = VerifierRegistry::new();
    registry.register(verifier);
    TaskProcessor::new(
        Arc::new(registry),
        ResponseSigner::new(Arc::new(identity())),
    )
}

fn task(index: u32, proof: &'static [u8]) -> Task {
    Task {
        index,
        proving_system_id: ProvingSystemId::PlonkBls12_381.code(),
        proof: Bytes::from_static(proof),
        public_input: Bytes::from(vec![index as u8]),
        verification_key: Bytes::from_static(b"vk"),
        created_at_block: index,
    }
}

#[tokio::test]
async fn test_responses_follow_delivery_order() {
    let mut h = Harness::start();
    let feed = h.next_feed().await;

    for i in 0..5 {
        let proof: &'static [u8] = if i % 2 == 0 { b"valid" } else { b"forged" };
        feed.deliver(task(i, proof)).await.unwrap();
    }
    for i in 0..5 {
        let response = h.next_response().await;
        assert_eq!(response.task_index(), i);
        assert_eq!(response.outcome.is_valid, i % 2 == 0);
        assert!(verify_signature(
            response.signer.bls_public_key.as_slice(),
            &response.digest,
            response.signature.as_slice(),
        ));
    }

    let stats = h.stop().await;
    assert_eq!(stats.responses, 5);
    assert_eq!(stats.abandoned, 0);
}

#[tokio::test]
async fn test_resubscribes_after_subscription_error() {
    let mut h = Harness::start();

    let first = h.next_feed().await;
    first.deliver(task(1, b"valid")).await.unwrap();
    assert_eq!(h.next_response().await.task_index(), 1);
    first.fail(SubscriptionError::Closed);

    let second = h.next_feed().await;
    second.deliver(task(2, b"valid")).await.unwrap();
    assert_eq!(h.next_response().await.task_index(), 2);

    assert_eq!(h.subscribes.load(Ordering::SeqCst), 2);
    let stats = h.stop().await;
    assert_eq!(stats.resubscriptions, 1);
}

#[tokio::test]
async fn test_dropped_feed_counts_as_subscription_loss() {
    let mut h = Harness::start();
    drop(h.next_feed().await);

    let next = h.next_feed().await;
    next.deliver(task(3, b"valid")).await.unwrap();
    assert_eq!(h.next_response().await.task_index(), 3);
    h.stop().await;
}

#[tokio::test]
async fn test_tasks_buffered_before_failure_are_processed() {
    let mut h = Harness::start();
    let feed = h.next_feed().await;
    feed.deliver(task(10, b"valid")).await.unwrap();
    feed.deliver(task(11, b"forged")).await.unwrap();
    feed.fail(SubscriptionError::Decode("garbage log".to_owned()));

    assert_eq!(h.next_response().await.task_index(), 10);
    assert_eq!(h.next_response().await.task_index(), 11);

    let _resubscribed = h.next_feed().await;
    h.stop().await;
}

#[tokio::test]
async fn test_failed_resubscribe_attempts_are_retried() {
    let mut h = Harness::start();
    let first = h.next_feed().await;
    h.fail_subscribes.store(3, Ordering::SeqCst);
    first.fail(SubscriptionError::Closed);

    let next = h.next_feed().await;
    next.deliver(task(4, b"valid")).await.unwrap();
    assert_eq!(h.next_response().await.task_index(), 4);

    // initial subscribe, three failures, then the one that worked
    assert_eq!(h.subscribes.load(Ordering::SeqCst), 5);
    h.stop().await;
}

#[tokio::test]
async fn test_unknown_proving_system_is_skipped() {
    let mut h = Harness::start();
    let feed = h.next_feed().await;

    let mut unknown = task(20, b"valid");
    unknown.proving_system_id = 999;
    feed.deliver(unknown).await.unwrap();
    let mut unsupported = task(21, b"valid");
    unsupported.proving_system_id = ProvingSystemId::Sp1.code();
    feed.deliver(unsupported).await.unwrap();
    feed.deliver(task(22, b"valid")).await.unwrap();

    assert_eq!(h.next_response().await.task_index(), 22);
    h.assert_no_response().await;

    let stats = h.stop().await;
    assert_eq!(stats.abandoned, 2);
    assert_eq!(stats.responses, 1);
}

#[tokio::test]
async fn test_malformed_verification_key_abandons_only_that_task() {
    let mut h = Harness::start();
    let feed = h.next_feed().await;

    let mut bad = task(30, b"valid");
    bad.verification_key = Bytes::from_static(b"bad");
    feed.deliver(bad).await.unwrap();
    feed.deliver(task(31, b"valid")).await.unwrap();

    let response = h.next_response().await;
    assert_eq!(response.task_index(), 31);
    assert!(response.outcome.is_valid);

    let stats = h.stop().await;
    assert_eq!(stats.abandoned, 1);
}

#[tokio::test]
async fn test_empty_proof_yields_negative_response() {
    let mut h = Harness::start();
    let feed = h.next_feed().await;
    feed.deliver(task(40, b"")).await.unwrap();

    let response = h.next_response().await;
    assert_eq!(response.task_index(), 40);
    assert!(!response.outcome.is_valid);
    h.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_idle_loop() {
    let mut h = Harness::start();
    let _feed = h.next_feed().await;
    let stats = h.stop().await;
    assert_eq!(stats, LoopStats::default());
}

#[tokio::test]
async fn test_initial_subscription_failure_is_fatal() {
    let mut source = MockChainEventSource::new();
    source
        .expect_subscribe()
        .times(1)
        .returning(|| Err(ChainIoError::Subscribe(TransportErrorKind::backend_gone())));

    let (_trigger, signal) = shutdown_channel();
    let result = OperatorLoop::new(
        source,
        processor(),
        MockResponseSink::new(),
        ReconnectPolicy::default(),
    )
    .run(signal)
    .await;

    assert!(matches!(result, Err(OperatorError::InitialSubscription(_))));
}

#[tokio::test]
async fn test_sink_failures_do_not_stop_the_loop() {
    let (feed, sub) = TaskSubscription::channel(4);
    let mut source = MockChainEventSource::new();
    let mut sub = Some(sub);
    source
        .expect_subscribe()
        .times(1)
        .returning(move || Ok(sub.take().expect("subscribed twice")));

    let (seen_tx, mut seen) = mpsc::unbounded_channel();
    let mut sink = MockResponseSink::new();
    sink.expect_submit().times(2).returning(move |response| {
        let _ = seen_tx.send(response.task_index());
        Err(SinkError::Closed)
    });

    let (trigger, signal) = shutdown_channel();
    let handle = tokio::spawn(
        OperatorLoop::new(source, processor(), sink, ReconnectPolicy::Immediate).run(signal),
    );

    feed.deliver(task(50, b"valid")).await.unwrap();
    feed.deliver(task(51, b"valid")).await.unwrap();
    assert_eq!(timeout(WAIT, seen.recv()).await.unwrap(), Some(50));
    assert_eq!(timeout(WAIT, seen.recv()).await.unwrap(), Some(51));

    trigger.trigger();
    let stats = timeout(WAIT, handle).await.unwrap().unwrap().unwrap();
    assert_eq!(stats.responses, 2);
}

#[tokio::test]
async fn test_in_flight_task_finishes_but_queued_tasks_wait_for_shutdown() {
    let (verifier, mut gate) = GatedVerifier::new();
    let mut h = Harness::start_with(ReconnectPolicy::Immediate, verifier);
    let feed = h.next_feed().await;

    feed.deliver(task(60, b"valid")).await.unwrap();
    feed.deliver(task(61, b"valid")).await.unwrap();
    assert_eq!(gate.wait_started().await, 60);

    h.trigger.trigger();
    gate.release();
    assert_eq!(h.next_response().await.task_index(), 60);

    let stats = h.join().await;
    assert_eq!(stats.responses, 1);
    assert!(gate.started.try_recv().is_err());
}

#[tokio::test]
async fn test_shutdown_skips_remaining_tasks_drained_after_failure() {
    let (verifier, mut gate) = GatedVerifier::new();
    let mut h = Harness::start_with(ReconnectPolicy::Immediate, verifier);
    let feed = h.next_feed().await;

    for i in 62..65 {
        feed.deliver(task(i, b"valid")).await.unwrap();
    }
    feed.fail(SubscriptionError::Closed);
    assert_eq!(gate.wait_started().await, 62);

    h.trigger.trigger();
    gate.release();
    assert_eq!(h.next_response().await.task_index(), 62);

    let subscribes = h.subscribes.clone();
    let stats = h.join().await;
    assert_eq!(stats.responses, 1);
    assert_eq!(stats.resubscriptions, 0);
    assert_eq!(subscribes.load(Ordering::SeqCst), 1);
    assert!(gate.started.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_policy_spaces_out_resubscribe_attempts() {
    let policy = ReconnectPolicy::Backoff {
        base: Duration::from_secs(1),
        max: Duration::from_secs(10),
        multiplier: 2.0,
    };
    let mut h = Harness::start_with(policy, Arc::new(ByteVerifier));
    let first = h.next_feed().await;

    // attempt 0 goes out at once, then 1s and 2s waits
    h.fail_subscribes.store(2, Ordering::SeqCst);
    let started = Instant::now();
    first.fail(SubscriptionError::Closed);

    let next = h.next_feed().await;
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(h.subscribes.load(Ordering::SeqCst), 4);

    next.deliver(task(66, b"valid")).await.unwrap();
    assert_eq!(h.next_response().await.task_index(), 66);
    let stats = h.stop().await;
    assert_eq!(stats.resubscriptions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_backoff_sleep() {
    let policy = ReconnectPolicy::Backoff {
        base: Duration::from_secs(60),
        max: Duration::from_secs(60),
        multiplier: 1.0,
    };
    let mut h = Harness::start_with(policy, Arc::new(ByteVerifier));
    let first = h.next_feed().await;

    h.fail_subscribes.store(1, Ordering::SeqCst);
    let started = Instant::now();
    first.fail(SubscriptionError::Closed);

    // let the immediate attempt fail; the loop is now sleeping for a minute
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.subscribes.load(Ordering::SeqCst), 2);

    let subscribes = h.subscribes.clone();
    let stats = h.stop().await;
    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(subscribes.load(Ordering::SeqCst), 2);
    assert_eq!(stats, LoopStats::default());
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines_containing(&self, needle: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_abandoned_task_log_names_proving_system() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut h = Harness::start();
    let feed = h.next_feed().await;

    let mut unknown = task(77, b"valid");
    unknown.proving_system_id = 999;
    feed.deliver(unknown).await.unwrap();
    let mut bad_key = task(78, b"valid");
    bad_key.verification_key = Bytes::from_static(b"bad");
    feed.deliver(bad_key).await.unwrap();
    feed.deliver(task(79, b"valid")).await.unwrap();
    assert_eq!(h.next_response().await.task_index(), 79);
    h.stop().await;

    let abandoned = logs.lines_containing("task abandoned");
    assert_eq!(abandoned.len(), 2, "{abandoned:?}");
    assert!(abandoned[0].contains("task_index=77"));
    assert!(abandoned[0].contains("proving_system_id=999"));
    assert!(abandoned[0].contains("error_kind=\"unknown_proving_system\""));
    assert!(abandoned[1].contains("task_index=78"));
    assert!(abandoned[1].contains("proving_system_id=0"));
    assert!(abandoned[1].contains("error_kind=\"malformed_task_data\""));
}
