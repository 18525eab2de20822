//! Integration tests for the CloudStack client
//!
//! These tests require a reachable CloudStack management server.
//! Set CLOUDSTACK_API_URL, CLOUDSTACK_API_KEY and CLOUDSTACK_SECRET_KEY to run.

use cloudstack_client::{ClientConfig, CloudStackClient, CloudStackClientTrait, ListPublicIpAddressesParams};

fn client_from_env() -> CloudStackClient {
    let url = std::env::var("CLOUDSTACK_API_URL")
        .unwrap_or_else(|_| "http://localhost:8080/client/api".to_string());
    let key = std::env::var("CLOUDSTACK_API_KEY")
        .expect("CLOUDSTACK_API_KEY environment variable must be set");
    let secret = std::env::var("CLOUDSTACK_SECRET_KEY")
        .expect("CLOUDSTACK_SECRET_KEY environment variable must be set");

    CloudStackClient::new(ClientConfig::new(url, key, secret)).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running CloudStack instance
async fn test_list_public_ip_addresses() {
    let client = client_from_env();

    let addresses = client
        .list_public_ip_addresses(ListPublicIpAddressesParams::default())
        .await
        .expect("Failed to list public IP addresses");

    println!("Found {} public IP addresses", addresses.len());
}

#[tokio::test]
#[ignore]
async fn test_network_offering_lookup() {
    let client = client_from_env();

    let (id, count) = client
        .get_network_offering_id("DefaultIsolatedNetworkOfferingWithSourceNatService")
        .await
        .expect("Failed to look up the default isolated offering");

    assert_eq!(count, 1);
    assert!(!id.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_unknown_network_is_no_match() {
    let client = client_from_env();

    let err = client
        .get_network_id("network-that-does-not-exist-0b6c")
        .await
        .expect_err("lookup of an unknown network should fail");

    assert!(err.to_string().contains("No match found"));
}
