//! System integrity watchdog and fail-closed lock.
//!
//! A background task periodically hashes a fixed set of protected files and
//! compares the combined digest against a baseline recorded at deployment.
//! Any mismatch, missing file, or read failure engages a persistent lock
//! marker; once the marker exists every request is rejected until an
//! operator removes it out of band. The core never clears the lock itself.

use crate::config::SecurityConfig;
use crate::errors::IntegrityError;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Result of one verification cycle. `evidence` is the computed hash on a
/// mismatch, or a description of the failure when hashing itself failed.
#[derive(Debug, Clone)]
pub struct Verification {
    pub ok: bool,
    pub evidence: String,
}

/// Computes a combined content hash over the protected file list and
/// compares it exactly against the trusted baseline.
#[derive(Debug, Clone)]
pub struct IntegrityVerifier {
    protected: Vec<PathBuf>,
    baseline: String,
}

impl IntegrityVerifier {
    pub fn new(protected: Vec<PathBuf>, baseline: String) -> Self {
        Self { protected, baseline }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            config.protected_files.iter().map(PathBuf::from).collect(),
            config.baseline_hash.clone(),
        )
    }

    /// One SHA-256 over the contents of every protected file, in configured
    /// order. Also used by the `baseline` CLI subcommand at deployment time.
    pub fn compute_combined_hash(&self) -> Result<String, IntegrityError> {
        let mut hasher = Sha256::new();
        for path in &self.protected {
            let bytes =
                std::fs::read(path).map_err(|source| IntegrityError::ProtectedFileUnreadable {
                    path: path.display().to_string(),
                    source,
                })?;
            hasher.update(&bytes);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Compare the freshly computed hash against the baseline.
    ///
    /// Fail-closed: an unreadable or missing protected file is a verification
    /// failure, not a transient error to be skipped.
    pub fn verify(&self) -> Verification {
        match self.compute_combined_hash() {
            Ok(hash) => Verification {
                ok: hash == self.baseline,
                evidence: hash,
            },
            Err(e) => Verification {
                ok: false,
                evidence: format!("hash computation failed: {}", e),
            },
        }
    }
}

/// Persistent boolean gate backed by a marker file. Presence means locked.
#[derive(Debug, Clone)]
pub struct SystemLock {
    marker: PathBuf,
    disabled: bool,
}

impl SystemLock {
    pub fn new(marker: impl Into<PathBuf>, disabled: bool) -> Self {
        Self {
            marker: marker.into(),
            disabled,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.lock_marker, config.disable_hash_verification)
    }

    /// Hot-path check: a single metadata probe, never any hashing.
    /// Always false when verification is disabled by configuration.
    pub fn is_locked(&self) -> bool {
        !self.disabled && self.marker.exists()
    }

    /// Write the lock marker with the failing evidence. Idempotent: engaging
    /// an already-locked system just rewrites the marker.
    pub fn engage(&self, evidence: &str) -> Result<(), IntegrityError> {
        let content = format!("{}\nlocked_at: {}\n", evidence, Utc::now().to_rfc3339());
        std::fs::write(&self.marker, content).map_err(|source| {
            IntegrityError::MarkerWriteFailed {
                path: self.marker.display().to_string(),
                source,
            }
        })
    }
}

/// Spawn the integrity watchdog: verify, engage on failure, sleep, repeat.
///
/// Runs until the shutdown channel fires. Locking, not exiting, is the
/// containment action, so the loop continues even after engaging the lock.
pub fn spawn_watchdog(
    verifier: IntegrityVerifier,
    lock: SystemLock,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "integrity watchdog started");
        loop {
            let verification = verifier.verify();
            if verification.ok {
                debug!("integrity verification passed");
            } else {
                error!(evidence = %verification.evidence, "integrity verification failed, engaging system lock");
                if let Err(e) = lock.engage(&verification.evidence) {
                    // The marker could not be written; keep trying next cycle
                    // rather than dying with the system unguarded.
                    error!(error = %e, "failed to engage system lock");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("integrity watchdog stopped");
                    return;
                }
            }
        }
    })
}
