// ============================================================
// Layer 6: Environment Configuration
// ============================================================
// Deployment settings (bucket names, region) come from the
// environment. They are checked for presence only, and a run
// aborts before touching storage if anything is missing.
//
//   preprocess → RAW_BUCKET, PROCESSED_BUCKET, AWS_DEFAULT_REGION
//   train      → PROCESSED_BUCKET, AWS_DEFAULT_REGION
//                (MODEL_BUCKET optional)
//
// An empty value counts as missing.

use thiserror::Error;

pub const RAW_BUCKET: &str = "RAW_BUCKET";
pub const PROCESSED_BUCKET: &str = "PROCESSED_BUCKET";
pub const MODEL_BUCKET: &str = "MODEL_BUCKET";
pub const AWS_REGION: &str = "AWS_DEFAULT_REGION";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
}

/// Collects required variables, remembering every one that is absent.
struct Required<'a, F> {
    lookup:  &'a F,
    missing: Vec<&'static str>,
}

impl<'a, F: Fn(&str) -> Option<String>> Required<'a, F> {
    fn new(lookup: &'a F) -> Self {
        Self { lookup, missing: Vec::new() }
    }

    fn get(&mut self, name: &'static str) -> String {
        match optional(self.lookup, name) {
            Some(v) => v,
            None => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVars(self.missing))
        }
    }
}

fn optional<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Settings for the `preprocess` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessEnv {
    pub raw_bucket:       String,
    pub processed_bucket: String,
    pub region:           String,
}

impl PreprocessEnv {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let mut req = Required::new(&lookup);
        let env = Self {
            raw_bucket:       req.get(RAW_BUCKET),
            processed_bucket: req.get(PROCESSED_BUCKET),
            region:           req.get(AWS_REGION),
        };
        req.finish()?;
        Ok(env)
    }
}

/// Settings for the `train` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainEnv {
    pub processed_bucket: String,
    pub model_bucket:     Option<String>,
    pub region:           String,
}

impl TrainEnv {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let mut req = Required::new(&lookup);
        let env = Self {
            processed_bucket: req.get(PROCESSED_BUCKET),
            model_bucket:     optional(&lookup, MODEL_BUCKET),
            region:           req.get(AWS_REGION),
        };
        req.finish()?;
        Ok(env)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_preprocess_env_complete() {
        let env = PreprocessEnv::from_lookup(lookup(&[
            (RAW_BUCKET, "raw"),
            (PROCESSED_BUCKET, "processed"),
            (AWS_REGION, "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(env.raw_bucket, "raw");
        assert_eq!(env.processed_bucket, "processed");
        assert_eq!(env.region, "eu-west-1");
    }

    #[test]
    fn test_preprocess_env_each_var_required() {
        let all = [
            (RAW_BUCKET, "raw"),
            (PROCESSED_BUCKET, "processed"),
            (AWS_REGION, "eu-west-1"),
        ];
        for skip in 0..all.len() {
            let partial: Vec<_> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, p)| *p)
                .collect();
            let err = PreprocessEnv::from_lookup(lookup(&partial)).unwrap_err();
            assert_eq!(err, ConfigError::MissingVars(vec![all[skip].0]));
        }
    }

    #[test]
    fn test_missing_vars_are_all_reported() {
        let err = PreprocessEnv::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: RAW_BUCKET, PROCESSED_BUCKET, AWS_DEFAULT_REGION"
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = TrainEnv::from_lookup(lookup(&[
            (PROCESSED_BUCKET, ""),
            (AWS_REGION, "us-east-1"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingVars(vec![PROCESSED_BUCKET]));
    }

    #[test]
    fn test_model_bucket_is_optional() {
        let env = TrainEnv::from_lookup(lookup(&[
            (PROCESSED_BUCKET, "processed"),
            (AWS_REGION, "us-east-1"),
        ]))
        .unwrap();
        assert_eq!(env.model_bucket, None);

        let env = TrainEnv::from_lookup(lookup(&[
            (PROCESSED_BUCKET, "processed"),
            (MODEL_BUCKET, "models"),
            (AWS_REGION, "us-east-1"),
        ]))
        .unwrap();
        assert_eq!(env.model_bucket.as_deref(), Some("models"));
    }

    #[test]
    fn test_train_env_requires_region() {
        let err = TrainEnv::from_lookup(lookup(&[(PROCESSED_BUCKET, "p")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVars(vec![AWS_REGION]));
    }
}
