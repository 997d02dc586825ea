use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_MAX_REQUESTS_PER_SECOND;

// NCBI E-utilities allow 10 req/s once an API key is supplied
const NCBI_KEYED_RATE: f64 = 10.0;

/// Public APIs the tool wrappers call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEndpoint {
    PubMed,
    PubTator,
    Kegg,
    Reactome,
    Hpo,
    BioThings,
    OpenGenes,
    ProteinAtlas,
    OpenTargets,
}

impl ApiEndpoint {
    pub const ALL: [ApiEndpoint; 9] = [
        ApiEndpoint::PubMed,
        ApiEndpoint::PubTator,
        ApiEndpoint::Kegg,
        ApiEndpoint::Reactome,
        ApiEndpoint::Hpo,
        ApiEndpoint::BioThings,
        ApiEndpoint::OpenGenes,
        ApiEndpoint::ProteinAtlas,
        ApiEndpoint::OpenTargets,
    ];

    pub fn base_url(self) -> &'static str {
        match self {
            ApiEndpoint::PubMed => "https://eutils.ncbi.nlm.nih.gov/entrez/eutils",
            ApiEndpoint::PubTator => "https://www.ncbi.nlm.nih.gov/research/pubtator3-api",
            ApiEndpoint::Kegg => "https://rest.kegg.jp",
            ApiEndpoint::Reactome => "https://reactome.org/ContentService",
            ApiEndpoint::Hpo => "https://ontology.jax.org/api/hp",
            ApiEndpoint::BioThings => "https://mygene.info/v3",
            ApiEndpoint::OpenGenes => "https://open-genes.com/api",
            ApiEndpoint::ProteinAtlas => "https://www.proteinatlas.org/api",
            ApiEndpoint::OpenTargets => "https://api.platform.opentargets.org/api/v4",
        }
    }

    /// Served by NCBI, so an `api_key` query parameter applies
    pub fn is_ncbi(self) -> bool {
        matches!(self, ApiEndpoint::PubMed | ApiEndpoint::PubTator)
    }

    pub fn default_rate(self, has_ncbi_key: bool) -> f64 {
        match self {
            ApiEndpoint::PubMed if has_ncbi_key => NCBI_KEYED_RATE,
            _ => DEFAULT_MAX_REQUESTS_PER_SECOND,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ApiEndpoint::PubMed => "pubmed",
            ApiEndpoint::PubTator => "pubtator",
            ApiEndpoint::Kegg => "kegg",
            ApiEndpoint::Reactome => "reactome",
            ApiEndpoint::Hpo => "hpo",
            ApiEndpoint::BioThings => "biothings",
            ApiEndpoint::OpenGenes => "opengenes",
            ApiEndpoint::ProteinAtlas => "proteinatlas",
            ApiEndpoint::OpenTargets => "opentargets",
        }
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        ApiEndpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == wanted)
            .ok_or_else(|| format!("Unknown API endpoint: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("PubMed".parse::<ApiEndpoint>(), Ok(ApiEndpoint::PubMed));
        assert_eq!("open_targets".parse::<ApiEndpoint>(), Ok(ApiEndpoint::OpenTargets));
        assert_eq!("Protein-Atlas".parse::<ApiEndpoint>(), Ok(ApiEndpoint::ProteinAtlas));
        assert!("uniprot".parse::<ApiEndpoint>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for endpoint in ApiEndpoint::ALL {
            assert_eq!(endpoint.to_string().parse::<ApiEndpoint>(), Ok(endpoint));
        }
    }

    #[test]
    fn test_ncbi_rates() {
        assert_eq!(ApiEndpoint::PubMed.default_rate(false), 3.0);
        assert_eq!(ApiEndpoint::PubMed.default_rate(true), 10.0);
        assert_eq!(ApiEndpoint::Kegg.default_rate(true), 3.0);
        assert!(ApiEndpoint::PubTator.is_ncbi());
        assert!(!ApiEndpoint::Reactome.is_ncbi());
    }
}
