// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity registry contract interface.

use alloy::sol;

// Define the registry interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IIdentityRegistry {
        struct DeathRecord {
            string metadataCID;
            uint256 timestamp;
        }

        function authorizedRegistrars(address registrar) external view returns (bool);
        function getWalletForNric(string nric) external view returns (address);
        function getNricForWallet(address wallet) external view returns (string);
        function isDeceased(string nric) external view returns (bool);
        function getTokenByNric(string nric) external view returns (uint256);
        function getDeathRecord(uint256 tokenId) external view returns (DeathRecord memory);

        function bindIdentity(string nric, address wallet) external;
        function recordDeath(string nric, string metadataCID) external;
    }
}
