use crate::{Error, EventStreamGenerator, MovieEvent, Result, SleepProvider, TimeSource};
use core::{pin::pin, time::Duration};
use futures::{
    FutureExt, Stream, StreamExt,
    future::{Pending, Ready, pending, ready},
    stream::FusedStream,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use tokio_util::sync::CancellationToken;

const START: u64 = 1_735_689_600_000;
const SECOND: Duration = Duration::from_secs(1);

#[derive(Clone, Default)]
struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    fn at(millis: u64) -> Self {
        let clock = Self::default();
        clock.set(millis);
        clock
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource<u64> for ManualClock {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Completes instantly after moving the shared clock forward by the requested
/// duration, and records every request.
#[derive(Clone)]
struct ManualSleep {
    clock: ManualClock,
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl ManualSleep {
    fn new(clock: &ManualClock) -> Self {
        Self {
            clock: clock.clone(),
            requested: Arc::default(),
        }
    }

    fn requested(&self) -> Vec<Duration> {
        self.requested.lock().unwrap().clone()
    }
}

impl SleepProvider for ManualSleep {
    type Sleep = Ready<()>;

    fn sleep_for(&self, dur: Duration) -> Self::Sleep {
        self.requested.lock().unwrap().push(dur);
        self.clock.advance(dur.as_millis() as u64);
        ready(())
    }
}

/// Never fires.
#[derive(Clone, Default)]
struct StalledSleep {
    armed: Arc<AtomicU64>,
}

impl SleepProvider for StalledSleep {
    type Sleep = Pending<()>;

    fn sleep_for(&self, _dur: Duration) -> Self::Sleep {
        self.armed.fetch_add(1, Ordering::SeqCst);
        pending()
    }
}

/// Fires instantly, but cancels the attached session while arming.
#[derive(Clone, Default)]
struct CancellingSleep {
    session: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancellingSleep {
    fn attach(&self, token: CancellationToken) {
        *self.session.lock().unwrap() = Some(token);
    }
}

impl SleepProvider for CancellingSleep {
    type Sleep = Ready<()>;

    fn sleep_for(&self, _dur: Duration) -> Self::Sleep {
        if let Some(token) = self.session.lock().unwrap().as_ref() {
            token.cancel();
        }
        ready(())
    }
}

#[derive(Clone)]
struct UnavailableSleep;

impl SleepProvider for UnavailableSleep {
    type Sleep = Ready<()>;

    fn sleep_for(&self, _dur: Duration) -> Self::Sleep {
        panic!("no timer may be armed when the provider is unavailable");
    }

    fn ensure_available(&self) -> Result<()> {
        Err(Error::ResourceExhausted {
            resource: "test timer".to_string(),
        })
    }
}

type ManualGenerator = EventStreamGenerator<ManualClock, ManualSleep>;

fn manual_generator(start: u64) -> (ManualClock, ManualSleep, ManualGenerator) {
    let clock = ManualClock::at(start);
    let sleeper = ManualSleep::new(&clock);
    let generator = EventStreamGenerator::new(clock.clone(), sleeper.clone());
    (clock, sleeper, generator)
}

fn pull<St>(stream: &mut St) -> Option<MovieEvent>
where
    St: Stream<Item = MovieEvent> + Unpin,
{
    stream
        .next()
        .now_or_never()
        .expect("manual timers never leave the stream pending")
}

#[test]
fn first_event_is_sampled_when_pulled() {
    let (clock, sleeper, generator) = manual_generator(START);
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    clock.advance(500);
    assert_eq!(stream.emitted(), 0);

    let event = pull(&mut stream).unwrap();
    assert_eq!(event.movie_id(), "abc123");
    assert_eq!(event.observed_at_millis(), START + 500);
    assert!(sleeper.requested().is_empty());
}

#[test]
fn events_are_spaced_by_the_cadence() {
    let (_clock, sleeper, generator) = manual_generator(START);
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    let events: Vec<_> = (0..5).map(|_| pull(&mut stream).unwrap()).collect();

    assert!(events.iter().all(|e| e.movie_id() == "abc123"));
    for pair in events.windows(2) {
        let gap = pair[1].observed_at_millis() - pair[0].observed_at_millis();
        assert!(gap >= 1_000, "gap of {gap} ms is shorter than the cadence");
    }
    assert_eq!(sleeper.requested(), vec![SECOND; 4]);
    assert_eq!(stream.emitted(), 5);
}

#[test]
fn slow_consumer_is_served_without_waiting() {
    let (clock, sleeper, generator) = manual_generator(START);
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    let first = pull(&mut stream).unwrap();
    clock.advance(4_500);
    let second = pull(&mut stream).unwrap();

    assert_eq!(first.observed_at_millis(), START);
    assert_eq!(second.observed_at_millis(), START + 4_500);
    assert!(sleeper.requested().is_empty());

    // The next tick is measured from the late emission, not from the schedule.
    let third = pull(&mut stream).unwrap();
    assert_eq!(third.observed_at_millis(), START + 5_500);
    assert_eq!(sleeper.requested(), vec![SECOND]);
}

#[test]
fn waits_only_for_the_rest_of_the_interval() {
    let (clock, sleeper, generator) = manual_generator(START);
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    pull(&mut stream).unwrap();
    clock.advance(300);
    let second = pull(&mut stream).unwrap();

    assert_eq!(sleeper.requested(), vec![Duration::from_millis(700)]);
    assert_eq!(second.observed_at_millis(), START + 1_000);
}

#[test]
fn clock_stepping_backwards_keeps_timestamps_ordered() {
    let (clock, sleeper, generator) = manual_generator(START);
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    let first = pull(&mut stream).unwrap();
    clock.set(START - 60_000);
    let second = pull(&mut stream).unwrap();

    // The wait is capped at one cadence and the reading is raised to the due
    // time.
    assert_eq!(sleeper.requested(), vec![SECOND]);
    assert_eq!(second.observed_at_millis(), first.observed_at_millis() + 1_000);
}

#[test]
fn sub_millisecond_cadence_still_advances_time() {
    let (_clock, _sleeper, generator) = manual_generator(START);
    let mut stream = pin!(
        generator
            .open_stream("abc123", Duration::from_micros(200))
            .unwrap()
    );

    let first = pull(&mut stream).unwrap();
    let second = pull(&mut stream).unwrap();
    assert!(second.observed_at_millis() > first.observed_at_millis());
}

#[test]
fn zero_cadence_is_rejected_before_anything_is_allocated() {
    let generator = EventStreamGenerator::new(ManualClock::at(START), UnavailableSleep);

    // The cadence is checked first, so the unavailable timer is never
    // consulted.
    let err = generator.open_stream("abc123", Duration::ZERO).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

#[test]
fn unavailable_timer_fails_the_open() {
    let generator = EventStreamGenerator::new(ManualClock::at(START), UnavailableSleep);
    let err = generator.open_stream("abc123", SECOND).unwrap_err();
    assert!(matches!(err, Error::ResourceExhausted { .. }));
}

#[test]
fn cancelled_before_the_first_pull_emits_nothing() {
    let (_clock, sleeper, generator) = manual_generator(START);
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    stream.cancel();

    assert!(pull(&mut stream).is_none());
    assert!(pull(&mut stream).is_none());
    assert!(stream.is_terminated());
    assert_eq!(stream.emitted(), 0);
    assert!(sleeper.requested().is_empty());
}

#[test]
fn cancellation_interrupts_a_pending_wait() {
    let sleeper = StalledSleep::default();
    let generator = EventStreamGenerator::new(ManualClock::at(START), sleeper.clone());
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    assert!(pull(&mut stream).is_some());
    assert!(stream.next().now_or_never().is_none());
    assert_eq!(sleeper.armed.load(Ordering::SeqCst), 1);

    stream.cancellation_token().cancel();

    assert_eq!(stream.next().now_or_never(), Some(None));
    assert_eq!(stream.emitted(), 1);
    assert_eq!(stream.size_hint(), (0, Some(0)));
}

#[test]
fn cancellation_while_the_timer_fires_emits_nothing() {
    let sleeper = CancellingSleep::default();
    let generator = EventStreamGenerator::new(ManualClock::at(START), sleeper.clone());
    let mut stream = pin!(generator.open_stream("abc123", SECOND).unwrap());

    assert!(pull(&mut stream).is_some());
    sleeper.attach(stream.cancellation_token());

    assert!(pull(&mut stream).is_none());
    assert!(stream.is_terminated());
    assert_eq!(stream.emitted(), 1);
}

#[test]
fn sessions_for_the_same_movie_are_independent() {
    let (clock, _sleeper, generator) = manual_generator(START);
    let mut a = pin!(generator.open_stream("abc123", SECOND).unwrap());

    clock.advance(250);
    let mut b = pin!(generator.open_stream("abc123", SECOND).unwrap());

    let a1 = pull(&mut a).unwrap();
    let b1 = pull(&mut b).unwrap();
    assert_eq!(a1.observed_at_millis(), START + 250);
    assert_eq!(b1.observed_at_millis(), START + 250);

    a.cancel();
    assert!(pull(&mut a).is_none());

    let b2 = pull(&mut b).unwrap();
    let b3 = pull(&mut b).unwrap();
    assert!(b2.observed_at_millis() - b1.observed_at_millis() >= 1_000);
    assert!(b3.observed_at_millis() - b2.observed_at_millis() >= 1_000);
    assert!(!b.is_cancelled());
}

#[test]
fn shutdown_ends_every_session() {
    let (_clock, _sleeper, generator) = manual_generator(START);
    let mut a = pin!(generator.open_stream("abc123", SECOND).unwrap());
    let mut b = pin!(generator.clone().open_stream("def456", SECOND).unwrap());

    assert!(pull(&mut a).is_some());
    generator.shutdown();

    assert!(generator.is_shut_down());
    assert!(pull(&mut a).is_none());
    assert!(pull(&mut b).is_none());

    let mut late = pin!(generator.open_stream("ghi789", SECOND).unwrap());
    assert!(pull(&mut late).is_none());
}

#[test]
fn streams_report_themselves_as_infinite() {
    let (_clock, _sleeper, generator) = manual_generator(START);
    let stream = generator.open_stream("abc123", SECOND).unwrap();
    assert_eq!(stream.size_hint(), (usize::MAX, None));
    assert_eq!(stream.cadence().as_duration(), SECOND);
    assert_eq!(stream.movie_id(), "abc123");
}

#[cfg(feature = "async-tokio")]
mod tokio_runtime {
    use super::*;
    use crate::{SystemClock, TokioSleep};
    use std::time::Instant;
    use tokio::time::timeout;

    #[tokio::test]
    async fn three_ticks_then_silence_after_cancel() {
        let generator = EventStreamGenerator::new(SystemClock, TokioSleep);
        let mut stream = Box::pin(generator.open_stream("abc123", SECOND).unwrap());

        let mut events = Vec::new();
        for _ in 0..3 {
            events.push(stream.next().await.unwrap());
        }

        assert!(events.iter().all(|e| e.movie_id() == "abc123"));
        for pair in events.windows(2) {
            assert!(pair[1].observed_at() > pair[0].observed_at());
            assert!(pair[1].observed_at_millis() - pair[0].observed_at_millis() >= 1_000);
        }

        stream.cancel();
        match timeout(Duration::from_secs(2), stream.next()).await {
            Ok(None) | Err(_) => {}
            Ok(Some(event)) => panic!("received {event:?} after cancellation"),
        }
    }

    #[tokio::test]
    async fn cancel_from_another_task_wakes_the_stream() {
        let generator = EventStreamGenerator::new(SystemClock, TokioSleep);
        let mut stream = Box::pin(
            generator
                .open_stream("abc123", Duration::from_secs(3600))
                .unwrap(),
        );
        let token = stream.cancellation_token();

        let consumer = tokio::spawn(async move {
            let first = stream.next().await;
            let second = stream.next().await;
            (first, second)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let cancelled_at = Instant::now();
        token.cancel();

        let (first, second) = timeout(Duration::from_secs(1), consumer)
            .await
            .expect("cancellation must not wait for the next tick")
            .unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(cancelled_at.elapsed() < Duration::from_secs(1));
    }
}
