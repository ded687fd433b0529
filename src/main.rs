// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;
use the_gridwood::allocation::SharedAllocation;
use the_gridwood::backends::local::kernels::BuiltinKernels;
use the_gridwood::backends::stub::RecordingExecutor;
use the_gridwood::config::load_and_validate_config;
use the_gridwood::element::DataType;
use the_gridwood::kernel::KernelRegistry;
use tracing_subscriber::EnvFilter;

const RUN_FLAG: &str = "--run";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let run = args.iter().skip(1).any(|a| a == RUN_FLAG);
    let config_files: Vec<&String> = args.iter().skip(1).filter(|a| *a != RUN_FLAG).collect();

    if config_files.is_empty() {
        eprintln!("Usage: {} <graph.yaml|json|toml> [more graphs ...] [{}]", args[0], RUN_FLAG);
        eprintln!("Example: {} configs/ramp-pipeline.yaml", args[0]);
        eprintln!("Example: {} configs/ramp-chain.toml {}", args[0], RUN_FLAG);
        std::process::exit(1);
    }

    let mut failed = false;
    for (i, config_file) in config_files.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }
        if let Err(e) = run_single_config(config_file, run).await {
            eprintln!("❌ {}: {:#}", config_file, e);
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}

async fn run_single_config(config_file: &str, run: bool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let builtins = BuiltinKernels::new();
    let mut registry = KernelRegistry::new();
    builtins.register(&mut registry)?;

    let config = load_and_validate_config(config_file, &registry)?;
    let mut graph = config.build(&registry)?;

    println!("📋 Graph: {}", graph.name().unwrap_or(config_file));
    println!(
        "🔧 Kernels: {}, connections: {}",
        graph.kernel_count(),
        graph.connection_count()
    );

    if run {
        let outputs = config.bind_outputs(&mut graph, &registry)?;
        let execution_start = Instant::now();
        graph.execute(&builtins.executor()).await?;
        println!("⏱️  Execution Time: {:?}", execution_start.elapsed());

        println!("\n📊 Outputs:");
        for (kernel_id, buffer) in &outputs {
            println!("  {} → {}", kernel_id, describe(buffer).await?);
        }
    } else {
        let recorder = RecordingExecutor::new();
        graph.execute(&recorder).await?;
        println!("\n🔄 Schedule (dry run):");
        for (i, kernel) in recorder.launched().await.iter().enumerate() {
            println!("  {}. {}", i + 1, kernel);
        }
    }

    graph.destroy().await?;
    println!("\n⏱️  Total Time (including load): {:?}", start_time.elapsed());
    Ok(())
}

/// Renders `f32` buffers as values and anything else as a size.
async fn describe(buffer: &SharedAllocation) -> anyhow::Result<String> {
    let allocation = buffer.lock().await;
    let element = allocation.element();
    if element.data_type() != Some(DataType::Float32) {
        return Ok(format!("[{} bytes]", allocation.bytes().len()));
    }
    let mut values = vec![0f32; allocation.ty().count() * element.vector_size() as usize];
    allocation.copy_to(&mut values)?;
    Ok(format!("{:?}", values))
}
