//! Settings command handler.

use anyhow::Result;
use probebridge_core::{
    BridgeSettings, BridgeSettingsPort, PortSetting, SettingsScope, SettingsUpdate, TransportKind,
};

use crate::bootstrap::CliContext;
use crate::commands::SettingsCommand;
use crate::error::CliError;

/// Execute the settings command.
pub async fn execute(ctx: &CliContext, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let settings = ctx.settings.load().await.map_err(CliError::from)?;
            for (label, value) in describe(&settings) {
                println!("{label:<24} {value}");
            }
            Ok(())
        }
        SettingsCommand::SetTransport { transport } => {
            persist(ctx, transport_update(transport)).await?;
            println!("✓ Transport set to {transport}");
            Ok(())
        }
        SettingsCommand::SetPort { port } => {
            let port = PortSetting::from(port);
            persist(ctx, SettingsUpdate::port(port)).await?;
            println!("✓ Port set to {port}");
            Ok(())
        }
        SettingsCommand::SetExtraArgs { args } => {
            let update = extra_args_update(&args);
            let cleared = update.extra_args == Some(None);
            persist(ctx, update).await?;
            if cleared {
                println!("✓ Extra arguments cleared");
            } else {
                println!("✓ Extra arguments set to: {}", args.trim());
            }
            Ok(())
        }
    }
}

async fn persist(ctx: &CliContext, update: SettingsUpdate) -> Result<()> {
    ctx.settings
        .update(SettingsScope::Persisted, update)
        .await
        .map_err(CliError::from)?;
    Ok(())
}

pub(crate) fn transport_update(transport: TransportKind) -> SettingsUpdate {
    SettingsUpdate {
        transport: Some(transport),
        ..SettingsUpdate::default()
    }
}

/// Blank input clears the arguments.
pub(crate) fn extra_args_update(args: &str) -> SettingsUpdate {
    let args = args.trim();
    SettingsUpdate {
        extra_args: Some((!args.is_empty()).then(|| args.to_string())),
        ..SettingsUpdate::default()
    }
}

fn describe(settings: &BridgeSettings) -> Vec<(&'static str, String)> {
    fn or_unset(value: Option<&String>) -> String {
        value.map_or_else(|| "(not set)".to_string(), Clone::clone)
    }

    let mut rows = vec![
        ("transport", settings.transport.to_string()),
        ("port", settings.port.to_string()),
    ];
    match settings.transport {
        TransportKind::Jtag => {
            rows.push(("jtag speed (kHz)", settings.jtag_speed.to_string()));
            rows.push((
                "jtag serial",
                settings
                    .jtag_serial
                    .map_or_else(|| "(any)".to_string(), |serial| serial.to_string()),
            ));
        }
        TransportKind::Ftdi => {
            rows.push(("ftdi speed (kHz)", settings.ftdi_speed.to_string()));
            rows.push(("ftdi vid:pid", or_unset(settings.ftdi_vid_pid.as_ref())));
            rows.push(("ftdi layout init", or_unset(settings.ftdi_layout_init.as_ref())));
            rows.push((
                "ftdi tdo falling edge",
                settings.ftdi_tdo_sample_falling_edge.to_string(),
            ));
        }
        TransportKind::Custom => {
            let lines = settings
                .custom_config
                .as_deref()
                .map_or(0, |text| text.lines().count());
            rows.push(("custom config", format!("{lines} line(s)")));
        }
    }
    rows.push(("extra args", or_unset(settings.extra_args.as_ref())));
    rows
}
