//! Unit tests for abm-scope.

#[cfg(test)]
mod frames {
    use abm_core::{AgentId, Value};

    use crate::{ExecutionScope, ScopeResult};

    #[test]
    fn lookup_walks_outward_and_shadows() {
        let mut scope = ExecutionScope::new("sim");
        scope.set_global("speed", 1);
        let mut outer = scope.push("outer");
        outer.declare("x", 10);
        {
            let mut inner = outer.push("inner");
            assert_eq!(inner.get("speed"), Some(&Value::Int(1)));
            assert_eq!(inner.get("x"), Some(&Value::Int(10)));
            inner.declare("x", 20);
            assert_eq!(inner.get("x"), Some(&Value::Int(20)));
        }
        assert_eq!(outer.get("x"), Some(&Value::Int(10)));
    }

    #[test]
    fn set_targets_nearest_declaring_frame() {
        let mut scope = ExecutionScope::default();
        scope.set_global("count", 0);
        {
            let mut a = scope.push("a");
            a.declare("local", 1);
            let mut b = a.push("b");
            b.set("count", 5);
            b.set("local", 2);
            b.set("fresh", 3);
            assert_eq!(b.locals().unwrap().len(), 1, "only 'fresh' lands in b");
        }
        assert_eq!(scope.get_global("count"), Some(&Value::Int(5)));
        assert!(scope.get("fresh").is_none());
        assert!(scope.get("local").is_none());
    }

    #[test]
    fn child_bindings_vanish_after_error_exit() {
        fn failing(scope: &mut ExecutionScope) -> ScopeResult<()> {
            let mut g = scope.push("block");
            g.declare("tmp", 42);
            assert!(g.contains("tmp"));
            if g.contains("tmp") {
                return Err(g.error("boom"));
            }
            Ok(())
        }

        let mut scope = ExecutionScope::default();
        let err = failing(&mut scope).unwrap_err();
        assert_eq!(err.location, "simulation/block");
        assert!(!scope.contains("tmp"));
        assert_eq!(scope.depth(), 0);
        assert_eq!(scope.current(), scope.root());
    }

    #[test]
    fn popped_handles_go_stale() {
        let mut scope = ExecutionScope::default();
        let id = {
            let mut g = scope.push("a");
            g.declare("v", 1);
            let id = g.id();
            assert!(g.is_live(id));
            id
        };
        assert!(!scope.is_live(id));
        assert!(scope.frame_locals(id).is_none());

        // A new frame never revives the old handle.
        let g = scope.push("b");
        assert_ne!(g.id(), id);
        assert!(g.frame_locals(id).is_none());
    }

    #[test]
    fn agent_and_location_are_inherited() {
        let mut scope = ExecutionScope::default();
        let mut a = scope.push_agent("ant#3", AgentId(3));
        let b = a.push("reflex");
        assert_eq!(b.agent(), Some(AgentId(3)));
        assert_eq!(b.location(), "simulation/ant#3/reflex");
        assert_eq!(b.depth(), 2);
    }

    #[test]
    fn run_in_pops() {
        let mut scope = ExecutionScope::default();
        let seen = scope.run_in("tmp", |s| {
            s.declare("x", true);
            s.get("x").cloned()
        });
        assert_eq!(seen, Some(Value::Bool(true)));
        assert!(scope.get("x").is_none());
    }

    #[test]
    fn save_and_restore_locals() {
        let mut scope = ExecutionScope::default();
        let mut memory = abm_core::Bindings::new();
        {
            let mut g = scope.push("state");
            g.declare("visits", 3);
            g.save_locals_into(&mut memory);
        }
        let mut g = scope.push("state");
        assert!(g.get("visits").is_none());
        g.restore_locals(&memory);
        assert_eq!(g.get("visits"), Some(&Value::Int(3)));
    }

    #[test]
    fn snapshot_is_ordered_and_nearest_wins() {
        let mut scope = ExecutionScope::default();
        scope.set_global("b", 1);
        scope.set_global("a", 1);
        let mut g = scope.push("f");
        g.declare("b", 2);
        let snap = g.snapshot();
        let keys: Vec<_> = snap.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(snap["b"], Value::Int(2));
    }
}

#[cfg(test)]
mod trace_mode {
    use std::io;
    use std::sync::{Arc, Mutex};

    use abm_core::AgentId;

    use crate::ExecutionScope;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn pushes_and_pops_are_logged_in_pairs() {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();

        let mut scope = ExecutionScope::new("sim");
        scope.set_trace(true);
        assert!(scope.is_tracing());
        tracing::subscriber::with_default(subscriber, || {
            let mut agent = scope.push_agent("ant#3", AgentId(3));
            {
                let block = agent.push("rule:eat");
                assert_eq!(block.depth(), 2);
                assert_eq!(block.location(), "sim/ant#3/rule:eat");
            }
            assert_eq!(agent.depth(), 1);
        });
        assert_eq!(scope.depth(), 0);
        assert_eq!(scope.location(), "sim");

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4, "{text}");
        assert!(lines[0].contains("enter ant#3"));
        assert!(lines[1].contains("enter rule:eat"));
        assert!(lines[2].contains("exit rule:eat"));
        assert!(lines[3].contains("exit ant#3"));
    }

    #[test]
    fn nothing_is_logged_when_off() {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        let mut scope = ExecutionScope::new("sim");
        tracing::subscriber::with_default(subscriber, || {
            let _frame = scope.push("quiet");
        });
        assert!(out.0.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod signals {
    use crate::{ExecutionScope, Signal};

    #[test]
    fn take_only_clears_matching() {
        let mut scope = ExecutionScope::default();
        scope.raise(Signal::Break);
        assert!(scope.interrupted());
        assert!(!scope.take_signal(Signal::Return));
        assert_eq!(scope.signal(), Signal::Break);
        assert!(scope.take_signal(Signal::Break));
        assert_eq!(scope.signal(), Signal::None);
        assert!(!scope.take_signal(Signal::None));
    }

    #[test]
    fn abort_is_sticky() {
        let mut scope = ExecutionScope::default();
        scope.raise(Signal::Abort);
        scope.raise(Signal::Die);
        scope.clear_signal();
        assert!(scope.is_aborted());
        scope.reset_signal();
        assert_eq!(scope.signal(), Signal::None);
    }

    #[test]
    fn signal_raised_in_child_reaches_root() {
        let mut scope = ExecutionScope::default();
        {
            let mut a = scope.push("a");
            let mut b = a.push("b");
            b.raise(Signal::Die);
        }
        assert_eq!(scope.signal(), Signal::Die);
    }

    #[test]
    fn pause_is_not_an_interruption() {
        assert!(!Signal::Pause.interrupts());
        assert!(!Signal::None.interrupts());
        for s in [Signal::Break, Signal::Continue, Signal::Return, Signal::Die, Signal::Abort] {
            assert!(s.interrupts(), "{s}");
        }
    }
}

#[cfg(test)]
mod hold {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use crate::{ExecutionScope, Signal};

    #[test]
    fn checkpoint_without_hold_returns_immediately() {
        let mut scope = ExecutionScope::default();
        assert_eq!(scope.checkpoint(), Signal::None);
    }

    #[test]
    fn pause_blocks_until_released() {
        let mut scope = ExecutionScope::default();
        let controller = scope.hold_controller();
        let (tx, rx) = mpsc::channel();

        let releaser = thread::spawn(move || {
            // Wait until the scope thread is actually suspended.
            while !controller.is_held() {
                thread::sleep(Duration::from_millis(1));
            }
            tx.send(()).unwrap();
            controller.release();
        });

        let after = scope.pause();
        assert!(rx.try_recv().is_ok(), "released only after the hold was observed");
        assert_eq!(after, Signal::None, "pause is consumed on resume");
        releaser.join().unwrap();
    }

    #[test]
    fn abort_request_wakes_a_paused_scope() {
        let mut scope = ExecutionScope::default();
        let controller = scope.hold_controller();
        let waker = thread::spawn(move || {
            while !controller.is_held() {
                thread::sleep(Duration::from_millis(1));
            }
            controller.request_abort();
        });
        assert_eq!(scope.pause(), Signal::Abort);
        waker.join().unwrap();
        scope.reset_signal();
        assert_eq!(scope.checkpoint(), Signal::None);
    }
}

#[cfg(test)]
mod errors {
    use abm_core::AgentId;

    use crate::{ErrorKind, ExecutionScope, Signal};

    #[test]
    fn errors_carry_agent_and_location() {
        let mut scope = ExecutionScope::default();
        let g = scope.push_agent("wolf#7", AgentId(7));
        let err = g.error("division by zero");
        assert_eq!(err.agent, Some(AgentId(7)));
        assert_eq!(err.kind, ErrorKind::Runtime { abort: false });
        assert!(!err.is_abort_class());
        assert_eq!(err.to_string(), "runtime error in AgentId(7) at simulation/wolf#7: division by zero");
    }

    #[test]
    fn warning_assertion() {
        let mut scope = ExecutionScope::default();
        let mut g = scope.push_agent("a", AgentId(1));
        assert!(g.check(true, "fine", true).is_ok());
        let err = g.check(false, "energy < 0", false).unwrap_err();
        assert!(err.is_warning());
        assert!(!err.is_abort_class());
        assert_eq!(g.signal(), Signal::None);
    }

    #[test]
    fn fatal_assertion_raises_abort() {
        let mut scope = ExecutionScope::default();
        let err = scope.check(false, "broken invariant", true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Assertion { fatal: true });
        assert!(err.is_abort_class());
        assert!(scope.is_aborted());
        assert!(err.to_string().starts_with("fatal assertion in simulation"));
    }

    #[test]
    fn raw_faults_are_attributed() {
        let mut scope = ExecutionScope::default();
        let g = scope.push_agent("a", AgentId(2));
        let parsed: Result<i32, _> = "x".parse::<i32>();
        let err = g.attribute(parsed).unwrap_err();
        assert_eq!(err.agent, Some(AgentId(2)));
        assert!(err.message.contains("invalid digit"));
    }
}
