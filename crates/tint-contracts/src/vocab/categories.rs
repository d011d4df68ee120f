/// Keyword class used by the offline matcher. `triggers` are looked up in the
/// lower-cased instruction, `fragments` in lower-cased surface names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub triggers: &'static [&'static str],
    pub fragments: &'static [&'static str],
}

impl SurfaceCategory {
    pub fn is_triggered_by(&self, lowered_text: &str) -> bool {
        self.triggers
            .iter()
            .any(|trigger| lowered_text.contains(trigger))
    }

    pub fn covers(&self, surface_name: &str) -> bool {
        let lowered = surface_name.to_lowercase();
        self.fragments
            .iter()
            .any(|fragment| lowered.contains(fragment))
    }
}

pub const EVERYTHING: SurfaceCategory = SurfaceCategory {
    key: "everything",
    label: "전체",
    triggers: &["전체", "모든", "전부", "everything", "entire", "whole"],
    fragments: &[],
};

pub const SURFACE_CATEGORIES: &[SurfaceCategory] = &[
    SurfaceCategory {
        key: "sole",
        label: "밑창",
        triggers: &["밑창", "바닥", "아웃솔", "sole", "bottom"],
        fragments: &["sole", "bottom", "outsole"],
    },
    SurfaceCategory {
        key: "upper",
        label: "갑피",
        triggers: &["갑피", "어퍼", "상단", "upper"],
        fragments: &["upper", "top", "mesh"],
    },
    SurfaceCategory {
        key: "fastener",
        label: "신발 끈",
        triggers: &["끈", "레이스", "lace"],
        fragments: &["lace", "string"],
    },
    SurfaceCategory {
        key: "branding",
        label: "로고",
        triggers: &["로고", "브랜드", "logo", "brand"],
        fragments: &["logo", "brand"],
    },
];
