use magichome_api::{Error, LightState, Result};
use magichome_drv_wifi::{Handle, Params};
use tracing::{error, info, warn};

mod action;
mod config;

use action::Action;

// Initializes the application. It determines the configuration and
// sets up the logger. It returns `None` if the program should exit
// (because a command line option asked for the configuration to be
// printed, for instance.)

async fn init_app() -> Option<(config::Config, config::Invocation)> {
    if let Some((cfg, inv)) = config::get().await {
        // The max log level is determined by the user (either
        // through the config file or the command line.)

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(cfg.get_log_level())
            .with_target(false)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("WARNING: couldn't install logger : {}", e)
        }
        Some((cfg, inv))
    } else {
        None
    }
}

fn show(name: &str, state: &LightState) {
    println!(
        "{}: {} hue:{} saturation:{} brightness:{}",
        name,
        if state.on { "on" } else { "off" },
        state.hue,
        state.saturation,
        state.brightness
    )
}

// Prints every state change until the controller goes away or the
// user hits ^C.

async fn watch(name: &str, handle: &Handle) -> Result<()> {
    let mut rx = handle.subscribe();

    show(name, &rx.borrow_and_update());
    loop {
        tokio::select! {
            res = rx.changed() => {
                if res.is_err() {
                    warn!("controller exited");
                    return Err(Error::MissingPeer("controller".to_owned()));
                }
                show(name, &rx.borrow_and_update())
            }

            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        }
    }
}

async fn perform(name: &str, handle: &Handle, action: Action) -> Result<()> {
    match action {
        Action::Status => {
            let state = handle.refresh().await?;

            show(name, &state);
            Ok(())
        }

        Action::Watch => {
            // Start with what the device reports. If it can't be
            // reached, keep going; polls will pick it up later.

            if let Err(e) = handle.refresh().await {
                warn!("couldn't read {} : {}", name, &e)
            }
            watch(name, handle).await
        }

        action => {
            if let Some(intent) = action.intent() {
                handle.apply(intent).await?;
            }

            // Effects run in the controller's task. Wait for them to
            // finish or the program would exit mid-effect.

            if action.is_effect() {
                handle.settle().await?;
            }
            Ok(())
        }
    }
}

// Runs the main body of the application: it reads the config, starts
// a controller for the requested device and carries out the command.

async fn run() -> Result<()> {
    if let Some((cfg, inv)) = init_app().await {
        let thresholds = cfg.get_thresholds();
        let device = match cfg.get_device(&inv.device) {
            Some(device) => device,
            None => {
                error!("no device named {}", &inv.device);
                return Err(Error::NotFound);
            }
        };
        let params = Params::try_from(device.cfg.clone())?;
        let (handle, task) =
            magichome_drv_wifi::start(&device.name, &params, thresholds);

        let result = perform(&device.name, &handle, inv.action).await;

        // Dropping the handle lets the controller exit. Wait for it so
        // everything it queued reaches the device.

        std::mem::drop(handle);
        if let Err(e) = task.await {
            error!("controller terminated abnormally : {}", e);
            return Err(Error::OperationError(
                "controller task failed".to_owned(),
            ));
        }
        result
    } else {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("ERROR: {}", e);
        std::process::exit(1)
    }
}
