use std::time::{Duration, SystemTime};

use keyhole_core::event::Event;
use keyhole_render::Buffer;
use keyhole_runtime::program::{Cmd, Deadline, Model};
use keyhole_runtime::simulator::ProgramSimulator;

struct TestModel {
    executed_after_quit: bool,
    timer_fired: bool,
}

#[derive(Debug)]
enum TestMsg {
    QuitInBatch,
    SetExecuted,
    ArmTimer,
    TimerFired,
}

impl From<Event> for TestMsg {
    fn from(_: Event) -> Self {
        TestMsg::QuitInBatch
    }
}

impl Model for TestModel {
    type Message = TestMsg;

    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
        match msg {
            TestMsg::QuitInBatch => Cmd::Batch(vec![
                Cmd::Quit,
                Cmd::Msg(TestMsg::SetExecuted), // Should NOT be executed
            ]),
            TestMsg::SetExecuted => {
                self.executed_after_quit = true;
                Cmd::None
            }
            TestMsg::ArmTimer => {
                Cmd::timer(Deadline::After(Duration::from_secs(1)), |_| TestMsg::TimerFired)
            }
            TestMsg::TimerFired => {
                self.timer_fired = true;
                Cmd::None
            }
        }
    }

    fn view(&self, _buffer: &mut Buffer) {}
}

fn model() -> TestModel {
    TestModel {
        executed_after_quit: false,
        timer_fired: false,
    }
}

#[test]
fn batch_stops_after_quit() {
    let mut sim = ProgramSimulator::new(model(), SystemTime::UNIX_EPOCH);
    sim.init();

    sim.send(TestMsg::QuitInBatch);

    assert!(
        !sim.model().executed_after_quit,
        "Commands after Quit in Batch should not be executed"
    );
    assert!(!sim.is_running(), "Simulator should have stopped");
}

#[test]
fn timers_do_not_fire_after_quit() {
    let mut sim = ProgramSimulator::new(model(), SystemTime::UNIX_EPOCH);
    sim.init();
    sim.send(TestMsg::ArmTimer);
    sim.inject_event(Event::Focus(true));
    sim.advance(Duration::from_secs(5));

    assert!(!sim.model().timer_fired);
    assert_eq!(sim.pending_timers(), 1);
}
