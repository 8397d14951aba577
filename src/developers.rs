//! Developer profiles, their indexed documents and synthetic sample data.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: u8,
    pub years: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub duration_months: u32,
    pub industry: String,
}

impl Experience {
    /// Read an experience entry back out of store metadata. Missing fields
    /// come back empty rather than failing the whole record.
    pub fn from_metadata(metadata: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            metadata
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            company: text("company"),
            position: text("position"),
            duration_months: metadata
                .get("duration_months")
                .and_then(Value::as_u64)
                .map_or(0, |months| u32::try_from(months).unwrap_or(u32::MAX)),
            industry: text("industry"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub major: String,
}

impl Default for Education {
    fn default() -> Self {
        Self {
            degree: "학사".to_string(),
            major: "컴퓨터공학".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Developer {
    pub developer_id: String,
    pub name: String,
    pub location: String,
    pub seniority: String,
    pub primary_role: String,
    pub years_experience: u32,
    pub availability: String,
    pub salary_range: String,
    pub skills: Vec<Skill>,
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Education,
    #[serde(default)]
    pub github_stars: u32,
    #[serde(default)]
    pub stackoverflow_reputation: u32,
}

impl Developer {
    /// Flat attributes stored alongside the profile document.
    pub fn profile_metadata(&self) -> Map<String, Value> {
        into_map(json!({
            "developer_id": self.developer_id,
            "name": self.name,
            "location": self.location,
            "seniority": self.seniority,
            "primary_role": self.primary_role,
            "years_experience": self.years_experience,
            "availability": self.availability,
            "salary_range": self.salary_range,
        }))
    }

    pub fn skill_metadata(&self, skill: &Skill) -> Map<String, Value> {
        into_map(json!({
            "developer_id": self.developer_id,
            "developer_name": self.name,
            "skill_name": skill.name,
            "skill_level": skill.level,
            "years_used": skill.years,
            "seniority": self.seniority,
        }))
    }

    pub fn experience_metadata(&self, exp: &Experience) -> Map<String, Value> {
        into_map(json!({
            "developer_id": self.developer_id,
            "developer_name": self.name,
            "company": exp.company,
            "position": exp.position,
            "duration_months": exp.duration_months,
            "industry": exp.industry,
            "seniority": self.seniority,
        }))
    }

    pub fn profile_text(&self) -> String {
        let skills = self
            .skills
            .iter()
            .take(5)
            .map(|s| format!("{}({}/5)", s.name, s.level))
            .collect::<Vec<_>>()
            .join(", ");
        let companies = self
            .experience
            .iter()
            .map(|e| e.company.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{name}은 {years}년 경력의 {seniority} {role} 개발자입니다.\n\
             주요 기술: {skills}\n\
             경력사: {companies}\n\
             위치: {location}\n\
             가용성: {availability}\n\
             학력: {degree} {major}\n\
             GitHub 스타: {stars}개",
            name = self.name,
            years = self.years_experience,
            seniority = self.seniority,
            role = self.primary_role,
            location = self.location,
            availability = self.availability,
            degree = self.education.degree,
            major = self.education.major,
            stars = self.github_stars,
        )
    }

    pub fn skill_text(&self, skill: &Skill) -> String {
        format!(
            "{} 기술 전문가\n숙련도: {}/5\n사용 경험: {}년\n개발자 레벨: {}\n총 경력: {}년",
            skill.name, skill.level, skill.years, self.seniority, self.years_experience
        )
    }

    pub fn experience_text(&self, exp: &Experience) -> String {
        format!(
            "{}에서 {}으로 {}개월 근무\n업계: {}\n현재 레벨: {}\n총 경력: {}년",
            exp.company,
            exp.position,
            exp.duration_months,
            exp.industry,
            self.seniority,
            self.years_experience
        )
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

const NAMES: &[&str] = &[
    "김철수", "이영희", "박민수", "최지영", "정현우", "한소영", "윤태호", "임수진", "강동현", "조미영",
];
const LOCATIONS: &[&str] = &[
    "서울", "경기", "부산", "대구", "대전", "광주", "인천", "울산", "세종",
];
const SENIORITIES: &[&str] = &["junior", "mid", "senior"];
const ROLES: &[&str] = &["frontend", "backend", "fullstack", "devops"];
const AVAILABILITIES: &[&str] = &["available", "busy", "considering"];
const COMPANIES: &[&str] = &[
    "네이버", "카카오", "쿠팡", "배달의민족", "토스", "당근마켓", "라인", "NHN", "구글", "페이스북",
    "삼성전자", "LG", "현대", "SK", "KT", "롯데", "포스코", "한화", "CJ", "GS", "두산", "LS", "효성",
    "삼성SDS", "LG CNS", "SK C&C", "KT DS", "현대오토에버", "현대모비스", "현대엔지니어링",
];
const SKILLS: &[&str] = &[
    "JavaScript", "Python", "Java", "React", "Vue", "Angular", "Node.js", "Spring", "Django", "AWS",
    "Docker", "Kubernetes",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

/// Generate `count` random developers with ids `dev_001`, `dev_002`, ...
///
/// Skill names are distinct per developer; employers may repeat.
pub fn generate_sample_developers<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Developer> {
    (0..count)
        .map(|i| {
            let skill_count = rng.random_range(3..=6);
            let skills = SKILLS
                .choose_multiple(rng, skill_count)
                .map(|name| Skill {
                    name: name.to_string(),
                    level: rng.random_range(3..=5),
                    years: rng.random_range(1..=8),
                })
                .collect::<Vec<_>>();

            let experience_count = rng.random_range(1..=3);
            let experience = (0..experience_count)
                .map(|_| Experience {
                    company: pick(rng, COMPANIES),
                    position: format!("{} 개발자", pick(rng, ROLES)),
                    duration_months: rng.random_range(6..=48),
                    industry: "IT/소프트웨어".to_string(),
                })
                .collect();

            Developer {
                developer_id: format!("dev_{:03}", i + 1),
                name: pick(rng, NAMES),
                location: pick(rng, LOCATIONS),
                seniority: pick(rng, SENIORITIES),
                primary_role: pick(rng, ROLES),
                years_experience: rng.random_range(1..=15),
                availability: pick(rng, AVAILABILITIES),
                salary_range: format!(
                    "{}000-{}000",
                    rng.random_range(3..=8),
                    rng.random_range(8..=15)
                ),
                skills,
                experience,
                education: Education::default(),
                github_stars: rng.random_range(0..=1000),
                stackoverflow_reputation: rng.random_range(0..=5000),
            }
        })
        .collect()
}
