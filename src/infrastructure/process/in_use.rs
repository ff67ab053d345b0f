//! 文件占用检测
//!
//! 这只是尽力而为的检测，不是锁：检测之后、替换之前仍可能有进程打开文件。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

use crate::error::{PatchError, PatchResult};

/// 占用检测方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// 优先 /proc，其次 lsof
    #[default]
    Auto,
    Proc,
    Lsof,
}

/// 查询哪些进程打开了某个文件
pub trait InUseProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// 返回持有该文件的进程 ID，未被占用时返回空列表
    fn holders(&self, path: &Path) -> io::Result<Vec<u32>>;
}

/// 通过扫描 `/proc/<pid>/fd` 检测
pub struct ProcFdProbe {
    proc_root: PathBuf,
}

impl ProcFdProbe {
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
        }
    }

    /// 当前系统是否提供 /proc
    pub fn is_available() -> bool {
        Path::new("/proc/self/fd").is_dir()
    }
}

impl Default for ProcFdProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl InUseProbe for ProcFdProbe {
    fn name(&self) -> &'static str {
        "proc"
    }

    fn holders(&self, path: &Path) -> io::Result<Vec<u32>> {
        let target = fs::canonicalize(path)?;
        let mut pids = Vec::new();

        for entry in fs::read_dir(&self.proc_root)?.flatten() {
            let pid = match entry.file_name().to_str().and_then(|name| name.parse::<u32>().ok()) {
                Some(pid) => pid,
                None => continue,
            };

            // 其他用户的进程或已退出的进程读不到，跳过
            let fds = match fs::read_dir(entry.path().join("fd")) {
                Ok(fds) => fds,
                Err(_) => continue,
            };

            for fd in fds.flatten() {
                if let Ok(link) = fs::read_link(fd.path()) {
                    if link == target {
                        pids.push(pid);
                        break;
                    }
                }
            }
        }

        Ok(pids)
    }
}

/// 通过 `lsof -t` 检测
pub struct LsofProbe {
    binary: PathBuf,
}

impl LsofProbe {
    /// 在 PATH 中查找 lsof
    pub fn locate() -> PatchResult<Self> {
        let binary = which("lsof")
            .map_err(|e| PatchError::missing_dependency("lsof", &e.to_string()))?;
        Ok(Self { binary })
    }
}

impl InUseProbe for LsofProbe {
    fn name(&self) -> &'static str {
        "lsof"
    }

    fn holders(&self, path: &Path) -> io::Result<Vec<u32>> {
        let output = Command::new(&self.binary)
            .arg("-t")
            .arg("--")
            .arg(path)
            .output()?;

        // 没有进程打开文件时 lsof 以 1 退出且没有输出
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.trim().is_empty() {
                return Ok(Vec::new());
            }
            return Err(io::Error::new(io::ErrorKind::Other, stderr.trim().to_string()));
        }

        Ok(parse_pid_lines(&stdout))
    }
}

fn parse_pid_lines(output: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// 根据配置选择检测方式
pub fn detect_probe(kind: ProbeKind) -> PatchResult<Box<dyn InUseProbe>> {
    match kind {
        ProbeKind::Proc => {
            if ProcFdProbe::is_available() {
                Ok(Box::new(ProcFdProbe::new()))
            } else {
                Err(PatchError::missing_dependency(
                    "/proc",
                    "procfs is not mounted on this system",
                ))
            }
        }
        ProbeKind::Lsof => Ok(Box::new(LsofProbe::locate()?)),
        ProbeKind::Auto => {
            if ProcFdProbe::is_available() {
                Ok(Box::new(ProcFdProbe::new()))
            } else {
                Ok(Box::new(LsofProbe::locate()?))
            }
        }
    }
}
