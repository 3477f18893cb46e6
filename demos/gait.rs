//! # Demo: gait
//!
//! Drives a three-knot gait from a table next to a simulated joystick.
//!
//! Shows how to:
//! - Build a [`GaitCyclePlan`] from CSV text and named setters.
//! - Integrate an axis with a [`StickFilter`] and read it through a getter.
//! - React to button clicks with a [`MultiClick`] handler.
//! - Run everything under a [`Runner`] with the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! feeder task ── mpsc<Event> ──► Runner ──► Host::turn
//!                                            ├─► StickFilter  (joy0axis0 integrated)
//!                                            ├─► MultiClick   (click → reverse)
//!                                            └─► GaitCyclePlan (knots → setters)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example gait
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use planvisor::{
    Bindings, ClickHandler, Config, Context, Cx, Event, GaitCyclePlan, Host, Input, LogWriter,
    MultiClick, NoResolve, Runner, Setter, Sheet, StickFilter, Subscribe, SystemClock,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const GAIT: &str = "\
# phase, hip, knee
t,hip,knee
0.0,10,0
0.33,-5,20
0.66,-10,
";

/// Flips the gait direction on every click.
struct Reverse {
    gait: Rc<RefCell<GaitCyclePlan>>,
}

impl ClickHandler for Reverse {
    fn on_click(&mut self, _cx: &Cx<'_>, event: &Event) -> bool {
        if let Ok(mut gait) = self.gait.try_borrow_mut() {
            let period = gait.period();
            gait.set_period(-period);
            println!("[demo] click {:?}: period {period:.2} → {:.2}", event.input, -period);
        }
        false
    }
}

fn setter(name: &'static str) -> Setter {
    Setter::infallible(name, move |v| println!("[demo] {name} = {v}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cx = Context::new(Rc::new(SystemClock::new()), Config::default());

    let bindings = Bindings::builder()
        .setter(setter("hip"))
        .setter(setter("knee"))
        .build(&NoResolve)?;
    let sheet: Sheet = GAIT.parse()?;
    let gait = GaitCyclePlan::with_sheet(&cx, sheet, bindings, 4.0)?.shared();
    gait.borrow_mut().set_period(1.0);

    let mut stick = StickFilter::from_config(&cx)?;
    stick.set_integrator("joy0axis0", 0.2, Some((-2.0, 2.0)), None)?;
    let speed = stick.getter_of("joy0axis0")?;

    let mut clicks = MultiClick::with_handler(&cx, Reverse { gait: gait.clone() });
    clicks.set_delay(0.2);

    let mut host = Host::new(cx.clone());
    host.launch(gait.clone());
    host.launch(stick.shared());
    host.launch(clicks.shared());

    let (tx, rx) = mpsc::channel(64);
    let feeder_cx = cx.clone();
    let feeder = async move {
        let at = || feeder_cx.now();
        let _ = tx.send(Event::axis(at(), 0, 0, 1.0)).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let _ = tx.send(Event::new(at(), Input::ButtonDown { joy: 0, button: 0 })).await;
        let _ = tx.send(Event::new(at(), Input::ButtonUp { joy: 0, button: 0 })).await;
    };

    let token = CancellationToken::new();
    let stop = token.clone();
    let timer = async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        stop.cancel();
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mut runner = Runner::new(host, subs);
    let (result, (), ()) = tokio::join!(runner.run(rx, token), feeder, timer);
    result?;

    println!("[demo] final speed input = {:.2}", speed());
    Ok(())
}
