// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::kernel::KernelNode;
use crate::traits::{KernelExecutor, KernelLaunch};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Runs nothing, remembering which kernels were launched and in what order.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    launched: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualified names of launched kernels, oldest first.
    pub async fn launched(&self) -> Vec<String> {
        self.launched.lock().await.clone()
    }
}

#[async_trait]
impl KernelExecutor for RecordingExecutor {
    async fn launch(&self, launch: &KernelLaunch) -> anyhow::Result<()> {
        self.launched.lock().await.push(launch.kernel.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Records like [`RecordingExecutor`] but fails when `target` is launched.
#[derive(Debug)]
pub struct FailingExecutor {
    target: KernelNode,
    recorder: RecordingExecutor,
}

impl FailingExecutor {
    pub fn new(target: &KernelNode) -> Self {
        Self {
            target: target.clone(),
            recorder: RecordingExecutor::new(),
        }
    }

    pub async fn launched(&self) -> Vec<String> {
        self.recorder.launched().await
    }
}

#[async_trait]
impl KernelExecutor for FailingExecutor {
    async fn launch(&self, launch: &KernelLaunch) -> anyhow::Result<()> {
        self.recorder.launch(launch).await?;
        if launch.kernel == self.target {
            anyhow::bail!("simulated failure in '{}'", launch.kernel);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
