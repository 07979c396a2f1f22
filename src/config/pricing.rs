use std::str::FromStr;

use anyhow::Context;
use bigdecimal::BigDecimal;
use log::warn;

use super::PricingSettings;
use crate::utils::normalize_address;

/// Parsed pricing configuration shared by the resolver and the tracker.
///
/// Addresses are lowercased once here so lookups can compare directly.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub wrapped_native: String,
    pub stable_pools: Vec<String>,
    whitelist: Vec<String>,
    pub min_usd_threshold_new_pools: BigDecimal,
    pub min_native_liquidity: BigDecimal,
    pub min_liquidity_providers: u64,
}

impl PricingConfig {
    pub fn new(
        wrapped_native: &str,
        stable_pools: &[&str],
        whitelist: &[&str],
        min_usd_threshold_new_pools: BigDecimal,
        min_native_liquidity: BigDecimal,
        min_liquidity_providers: u64,
    ) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(whitelist.len());
        for entry in whitelist {
            let address = normalize_address(entry);
            if normalized.contains(&address) {
                warn!("Duplicate whitelist entry {} ignored", address);
                continue;
            }
            normalized.push(address);
        }

        let wrapped_native = normalize_address(wrapped_native);
        if !normalized.is_empty() && !normalized.contains(&wrapped_native) {
            warn!(
                "Wrapped native {} is not whitelisted; pools against it will not track volume",
                wrapped_native
            );
        }

        Self {
            wrapped_native,
            stable_pools: stable_pools.iter().map(|p| normalize_address(p)).collect(),
            whitelist: normalized,
            min_usd_threshold_new_pools,
            min_native_liquidity,
            min_liquidity_providers,
        }
    }

    pub fn from_settings(settings: &PricingSettings) -> anyhow::Result<Self> {
        let min_usd = BigDecimal::from_str(settings.min_usd_threshold_new_pools.trim())
            .with_context(|| {
                format!(
                    "Invalid min_usd_threshold_new_pools: {}",
                    settings.min_usd_threshold_new_pools
                )
            })?;
        let min_native = BigDecimal::from_str(settings.min_native_liquidity.trim())
            .with_context(|| {
                format!("Invalid min_native_liquidity: {}", settings.min_native_liquidity)
            })?;

        let stable_pools: Vec<&str> = settings.stable_pools.iter().map(String::as_str).collect();
        let whitelist: Vec<&str> = settings.whitelist.iter().map(String::as_str).collect();

        Ok(Self::new(
            &settings.wrapped_native,
            &stable_pools,
            &whitelist,
            min_usd,
            min_native,
            settings.min_liquidity_providers,
        ))
    }

    /// Whitelisted tokens in tie-break order.
    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Check if a token is a trusted reference for pricing and volume.
    pub fn is_whitelisted(&self, token: &str) -> bool {
        self.whitelist
            .iter()
            .any(|entry| entry.eq_ignore_ascii_case(token))
    }

    pub fn is_wrapped_native(&self, token: &str) -> bool {
        self.wrapped_native.eq_ignore_ascii_case(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(whitelist: &[&str]) -> PricingSettings {
        PricingSettings {
            wrapped_native: "0x4446Fc4eb47f2f6586f9fAAb68B3498F86C07521".to_string(),
            stable_pools: vec!["0x86C49BA0825FC1F736C67E5D58F49A76018D5E5A".to_string()],
            whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
            min_usd_threshold_new_pools: "400000".to_string(),
            min_native_liquidity: "2".to_string(),
            min_liquidity_providers: 5,
        }
    }

    #[test]
    fn test_from_settings_normalizes_and_keeps_order() {
        let config = PricingConfig::from_settings(&settings(&[
            "0xD6C7E27A598714C2226404EB054E0C074C906FC9",
            "0x4446Fc4eb47f2f6586f9fAAb68B3498F86C07521",
            "0xd6c7e27a598714c2226404eb054e0c074c906fc9",
        ]))
        .unwrap();

        assert_eq!(
            config.whitelist(),
            &[
                "0xd6c7e27a598714c2226404eb054e0c074c906fc9".to_string(),
                "0x4446fc4eb47f2f6586f9faab68b3498f86c07521".to_string(),
            ]
        );
        assert_eq!(config.stable_pools, vec!["0x86c49ba0825fc1f736c67e5d58f49a76018d5e5a"]);
        assert!(config.is_whitelisted("0x4446FC4EB47F2F6586F9FAAB68B3498F86C07521"));
        assert!(config.is_wrapped_native("0x4446fc4eb47f2f6586f9faab68b3498f86c07521"));
        assert_eq!(config.min_usd_threshold_new_pools, BigDecimal::from(400000));
        assert_eq!(config.min_native_liquidity, BigDecimal::from(2));
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let mut bad = settings(&[]);
        bad.min_native_liquidity = "two".to_string();
        assert!(PricingConfig::from_settings(&bad).is_err());
    }
}
