//! The frozen five-requirement catalog: ids, compliance questions, rubrics,
//! and BM25 query strings. These strings are part of the system's observed
//! behavior and must not drift between releases — treat them as frozen
//! constants, not editable configuration.

/// One entry in the requirement catalog.
#[derive(Debug, Clone, Copy)]
pub struct RequirementCatalogEntry {
    pub id: &'static str,
    pub compliance_question: &'static str,
    pub rubric: &'static str,
    pub bm25_query: &'static str,
}

/// The five fixed compliance requirements, in catalog order.
pub const REQUIREMENTS: [RequirementCatalogEntry; 5] = [
    RequirementCatalogEntry {
        id: "password_management",
        compliance_question: "Does the contract require adequate password management controls (complexity, length, rotation, hashing, MFA, lockout)?",
        rubric: "Fully Compliant: the contract mandates minimum password length and complexity, periodic rotation or equivalent risk mitigation, salted hashing (or a vault/secrets manager) for stored credentials, and multi-factor authentication or account lockout after failed attempts. Partially Compliant: the contract addresses some but not all of these controls, or addresses them without enforceable specificity (e.g. \"strong passwords\" with no defined policy). Non-Compliant: the contract is silent on password management or explicitly allows weak practices (e.g. shared accounts, plaintext storage).",
        bm25_query: "password policy complexity length rotation hashing mfa lockout vault",
    },
    RequirementCatalogEntry {
        id: "it_asset_management",
        compliance_question: "Does the contract require a documented IT asset management process (inventory, classification, lifecycle, disposal)?",
        rubric: "Fully Compliant: the contract requires a maintained asset inventory, classification of assets by sensitivity, defined lifecycle management, and secure disposal or sanitization procedures for retired assets. Partially Compliant: the contract requires an inventory or disposal procedure but not both, or leaves classification/lifecycle unaddressed. Non-Compliant: the contract does not address asset management at all.",
        bm25_query: "asset inventory management lifecycle classification disposal decommission hardware tracking",
    },
    RequirementCatalogEntry {
        id: "security_training_background_checks",
        compliance_question: "Does the contract require security awareness training and background checks for personnel with access to sensitive data or systems?",
        rubric: "Fully Compliant: the contract mandates recurring security awareness training for all relevant personnel and background/criminal checks prior to granting access to sensitive systems or data. Partially Compliant: the contract requires only training or only background checks, or requires them without a defined cadence or scope. Non-Compliant: the contract does not address personnel security training or screening.",
        bm25_query: "security awareness training background check screening personnel onboarding vetting",
    },
    RequirementCatalogEntry {
        id: "data_in_transit_encryption",
        compliance_question: "Does the contract require encryption of data in transit (e.g. TLS) for all transmissions of sensitive data?",
        rubric: "Fully Compliant: the contract requires strong encryption (TLS 1.2+ or equivalent) for all transmission of sensitive/confidential data, with no stated exceptions. Partially Compliant: the contract requires encryption in transit for some channels or data types but not uniformly, or references encryption without specifying an adequate standard. Non-Compliant: the contract does not require encryption of data in transit, or explicitly permits unencrypted transmission of sensitive data.",
        bm25_query: "tls ssl encryption certificate cipher data in transit transmission secure channel https",
    },
    RequirementCatalogEntry {
        id: "network_authentication_authorization",
        compliance_question: "Does the contract require network-level authentication and authorization controls (e.g. least privilege, role-based access, network segmentation)?",
        rubric: "Fully Compliant: the contract requires authentication for network access, role-based or least-privilege authorization, and network segmentation or equivalent controls restricting lateral access. Partially Compliant: the contract requires authentication or authorization but not both, or addresses access control without addressing network segmentation. Non-Compliant: the contract does not address network authentication or authorization.",
        bm25_query: "network authentication authorization access control least privilege role based segmentation firewall vpn",
    },
];
