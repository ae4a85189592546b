#[cfg(test)]
mod tests {
    use deferred::{Deferred, Error, Status};
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future::ready;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::{thread, time::Duration};

    #[test]
    fn test_deferred_resolved_from_another_thread() {
        let deferred = Deferred::<i32, ()>::new();
        let resolve = deferred.resolver();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            resolve(42);
        });

        let result = block_on(deferred.promise());
        assert_eq!(result, Ok(42));
        assert!(deferred.is_resolved());
    }

    #[test]
    fn test_will_not_resolve_twice_or_fail_after_resolving() {
        let deferred = Deferred::<&str, &str>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let observed = deferred.and_then(move |value| {
            counter.fetch_add(1, Ordering::SeqCst);
            ready(Ok(value))
        });

        deferred.resolve("a");
        deferred.resolve("b");
        deferred.reject("c");
        assert_eq!(deferred.status(), Status::Resolved);

        assert_eq!(block_on(observed.promise()), Ok("a"));
        assert_eq!(block_on(observed.promise()), Ok("a"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrap_base_settled_later_on_another_thread() {
        let (tx, rx) = oneshot::channel::<i32>();
        let deferred = Deferred::<i32, ()>::wrap(rx.map(|received| received.map_err(|_| ())));

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send(4234).expect("The deferred stopped listening");
        });

        assert_eq!(block_on(deferred.promise()), Ok(4234));
        assert_eq!(deferred.status(), Status::Resolved);
        sender.join().expect("The sender thread has panicked");
    }

    #[test]
    fn test_wrap_direct_settlement_wins_over_late_base() {
        let (tx, rx) = oneshot::channel::<i32>();
        let deferred = Deferred::<i32, ()>::wrap(rx.map(|received| received.map_err(|_| ())));
        let waiter = {
            let promise = deferred.promise();
            thread::spawn(move || block_on(promise))
        };

        deferred.resolve(42);
        let _ = tx.send(7);

        assert_eq!(waiter.join().expect("The waiter thread has panicked"), Ok(42));
        assert_eq!(deferred.status(), Status::Resolved);
    }

    #[test]
    fn test_concurrent_settlement_has_one_winner() {
        let deferred = Deferred::<usize, usize>::new();
        let barrier = Arc::new(Barrier::new(8));
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let deferred = deferred.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        deferred.resolve(i);
                    } else {
                        deferred.reject(i);
                    }
                })
            })
            .collect();
        for task in tasks {
            task.join().expect("A settling thread has panicked");
        }

        let outcome = block_on(deferred.promise());
        match deferred.status() {
            Status::Resolved => assert!(matches!(outcome, Ok(i) if i % 2 == 0)),
            Status::Rejected => assert!(matches!(outcome, Err(i) if i % 2 == 1)),
            Status::Pending => panic!("deferred still pending after settlement"),
        }
    }

    #[test]
    fn test_chain_waits_for_parent() {
        let deferred = Deferred::<i32, String>::new();
        let chained = deferred
            .and_then(|value| ready(Ok(value + 1)))
            .catch(|error: String| ready(Ok::<_, ()>(error.len() as i32)));
        let waiter = {
            let promise = chained.promise();
            thread::spawn(move || block_on(promise))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(chained.is_pending());
        deferred.reject("three".into());

        assert_eq!(waiter.join().expect("The waiter thread has panicked"), Ok(5));
        assert!(chained.is_resolved());
    }

    #[test]
    fn test_unit_payloads_never_panic() {
        let deferred = Deferred::<(), ()>::default();
        for _ in 0..3 {
            deferred.resolve(()).reject(());
        }
        assert_eq!(block_on(deferred.promise()), Ok(()));
    }

    #[test]
    fn test_dropped_deferred_is_reported_abandoned() {
        let promise = Deferred::<i32, ()>::new().promise();
        assert_eq!(promise.try_outcome(), Err(Error::Abandoned));
        assert_eq!(promise.now_or_never(), None);
    }
}

mod first_writer_wins {
    use deferred::{Deferred, Status};
    use futures::executor::block_on;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Call {
        Resolve(u8),
        Reject(u8),
    }

    fn arb_call() -> impl Strategy<Value = Call> {
        prop_oneof![any::<u8>().prop_map(Call::Resolve), any::<u8>().prop_map(Call::Reject)]
    }

    proptest! {
        /// Only the first settlement call decides status and outcome.
        #[test]
        fn first_call_decides_outcome(calls in prop::collection::vec(arb_call(), 1..16)) {
            let deferred = Deferred::<u8, u8>::new();
            for call in &calls {
                match *call {
                    Call::Resolve(value) => deferred.resolve(value),
                    Call::Reject(error) => deferred.reject(error),
                };
            }

            let (status, outcome) = match calls[0] {
                Call::Resolve(value) => (Status::Resolved, Ok(value)),
                Call::Reject(error) => (Status::Rejected, Err(error)),
            };
            prop_assert_eq!(deferred.status(), status);
            prop_assert_eq!(block_on(deferred.promise()), outcome);
        }
    }
}
