/// Coverage branches of the monitored field. Every run plans at least one
/// query per branch so no branch goes dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicBranch {
    GenomeEngineering,
    GeneTherapy,
    CellTherapy,
    RnaTherapeutics,
    TranslationalOncology,
    RegulatoryCmc,
}

impl TopicBranch {
    pub const ALL: [TopicBranch; 6] = [
        TopicBranch::GenomeEngineering,
        TopicBranch::GeneTherapy,
        TopicBranch::CellTherapy,
        TopicBranch::RnaTherapeutics,
        TopicBranch::TranslationalOncology,
        TopicBranch::RegulatoryCmc,
    ];

    /// Search phrases characteristic of the branch, most specific first.
    pub fn phrases(&self) -> &'static [&'static str] {
        match self {
            TopicBranch::GenomeEngineering => &[
                "crispr base editing",
                "prime editing in vivo",
                "gene editing clinical",
            ],
            TopicBranch::GeneTherapy => &[
                "gene therapy approval",
                "aav gene therapy",
                "gene therapy first-in-human",
            ],
            TopicBranch::CellTherapy => &[
                "car-t cell therapy",
                "allogeneic cell therapy",
                "engineered cell therapy trial",
            ],
            TopicBranch::RnaTherapeutics => &[
                "mrna therapeutic",
                "sirna therapy results",
                "antisense oligonucleotide trial",
            ],
            TopicBranch::TranslationalOncology => &[
                "first-in-human oncology trial",
                "tumor response gene therapy",
                "solid tumor cell therapy data",
            ],
            TopicBranch::RegulatoryCmc => &[
                "fda biologics approval",
                "ema marketing authorisation advanced therapy",
                "biologics license application accepted",
            ],
        }
    }
}

/// Domains worth querying directly with `site:` scoping. Mixes regulators,
/// registries and journals so primary sources surface even when general
/// queries drown in press coverage.
pub const SITE_SCOPED_DOMAINS: &[&str] = &[
    "fda.gov",
    "ema.europa.eu",
    "clinicaltrials.gov",
    "nature.com",
    "science.org",
    "nejm.org",
    "biorxiv.org",
    "statnews.com",
    "endpts.com",
    "fiercebiotech.com",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_branch_has_phrases() {
        for branch in TopicBranch::ALL {
            assert!(!branch.phrases().is_empty(), "{branch:?} has no phrases");
        }
    }

    #[test]
    fn all_lists_each_branch_once() {
        for branch in TopicBranch::ALL {
            let count = TopicBranch::ALL.iter().filter(|b| **b == branch).count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn phrases_are_lowercase() {
        for branch in TopicBranch::ALL {
            for phrase in branch.phrases() {
                assert_eq!(*phrase, phrase.to_lowercase());
            }
        }
    }
}
