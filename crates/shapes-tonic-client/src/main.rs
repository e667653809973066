#![doc = include_str!("../README.md")]

mod client;

use clap::Parser;
use client::{
    config::{CliArgs, ClientConfig, Command},
    driver::ShapeClient,
    output::{print_shape, status_line},
    telemetry::init_telemetry,
};
use shapes_tonic_core::{Result, proto::Code};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let command = args.command.clone();
    let config = ClientConfig::try_from(args)?;

    init_telemetry()?;

    let mut client = ShapeClient::new(&config).await?;
    match run(&mut client, command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            println!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(client: &mut ShapeClient, command: Command) -> Result<()> {
    match command {
        Command::Create { shape_type } => {
            let response = client.create_shape(shape_type).await?;
            println!("{}", status_line(response.status_code(), &response.message));
            if let Some(shape) = &response.shape {
                print_shape(shape);
            }
        }
        Command::Get { shape_id } => {
            let response = client.get_shape(shape_id).await?;
            println!("{}", status_line(response.status_code(), &response.message));
            if let Some(shape) = &response.shape {
                print_shape(shape);
            }
        }
        Command::Perimeters { min_perimeter } => {
            let mut stream = client.get_perimeters_greater_than(min_perimeter).await?;
            while let Some(item) = stream.message().await? {
                println!("{}", status_line(item.status_code(), &item.message));
            }
        }
        Command::TotalArea { shape_ids } => {
            let response = client.get_total_area(shape_ids).await?;
            println!("{}", status_line(response.status_code(), &response.message));
            println!("total_area: {}", response.total_area);
            if response.status_code() == Code::Ok {
                println!("valid_ids: {:?}", response.valid_ids);
            }
            println!("invalid_ids: {:?}", response.invalid_ids);
        }
        Command::Areas { shape_ids } => {
            let mut stream = client.get_areas(shape_ids).await?;
            while let Some(item) = stream.message().await? {
                println!("{}", status_line(item.status_code(), &item.message));
            }
        }
    }
    Ok(())
}
