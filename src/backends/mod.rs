// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! [`KernelExecutor`](crate::traits::KernelExecutor) implementations.
//!
//! ## Local Backend
//! In-process Rust closures registered per kernel, plus a small module of
//! built-in kernels that graph descriptions can refer to by name
//! (`builtin.fill_ramp`, `builtin.copy`, ...).
//!
//! ## Stub Backend
//! Executors that run no kernel bodies:
//! - **RecordingExecutor**: remembers the launch order, used for dry runs
//! - **FailingExecutor**: fails on one chosen kernel, for error-path tests
//!
//! ```rust
//! use the_gridwood::backends::stub::RecordingExecutor;
//! use the_gridwood::engine::ExecutionGraphBuilder;
//! use the_gridwood::kernel::KernelModule;
//!
//! # tokio_test_block(async {
//! let module = KernelModule::new("demo");
//! let only = module.kernel(0, "only");
//! let mut builder = ExecutionGraphBuilder::new();
//! builder.add_kernel(&only)?;
//! let mut graph = builder.create()?;
//!
//! let recorder = RecordingExecutor::new();
//! graph.execute(&recorder).await?;
//! assert_eq!(recorder.launched().await, vec!["demo.only".to_string()]);
//! # Ok::<(), the_gridwood::errors::Error>(())
//! # }).unwrap();
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod local;
pub mod stub;
