use cosmwasm_schema::cw_serde;

/// Points for completing the survey at all.
pub const BASE_POINTS: u32 = 50;
pub const MRI_POINTS: u32 = 10;
pub const CT_POINTS: u32 = 8;
pub const ULTRASOUND_POINTS: u32 = 5;
pub const XRAY_POINTS: u32 = 3;
pub const EMAIL_POINTS: u32 = 5;
pub const PHONE_POINTS: u32 = 5;
pub const CHALLENGES_POINTS: u32 = 10;
pub const SOLUTIONS_POINTS: u32 = 10;
/// Awarded to a submission that arrives through a referral, and to the
/// referrer's own facility.
pub const REFERRAL_BONUS: u32 = 25;

/// Imaging units reported by a facility.
#[cw_serde]
#[derive(Default)]
pub struct EquipmentCounts {
    pub mri: u32,
    pub ct: u32,
    pub ultrasound: u32,
    pub xray: u32,
}

/// Inputs to the incentive score of one survey submission.
#[derive(Clone, Debug, PartialEq)]
pub struct SurveyScore<'a> {
    pub equipment: &'a EquipmentCounts,
    pub respondent_email: Option<&'a str>,
    pub respondent_phone: Option<&'a str>,
    pub challenges: Option<&'a str>,
    pub solutions: Option<&'a str>,
    pub referred: bool,
}

fn filled(field: Option<&str>) -> bool {
    field.map(|s| !s.trim().is_empty()).unwrap_or(false)
}

impl<'a> SurveyScore<'a> {
    /// A submission that reports equipment and nothing else.
    pub fn new(equipment: &'a EquipmentCounts) -> Self {
        Self {
            equipment,
            respondent_email: None,
            respondent_phone: None,
            challenges: None,
            solutions: None,
            referred: false,
        }
    }

    pub fn points(&self) -> u32 {
        let eq = self.equipment;
        let mut points = BASE_POINTS
            .saturating_add(eq.mri.saturating_mul(MRI_POINTS))
            .saturating_add(eq.ct.saturating_mul(CT_POINTS))
            .saturating_add(eq.ultrasound.saturating_mul(ULTRASOUND_POINTS))
            .saturating_add(eq.xray.saturating_mul(XRAY_POINTS));

        let optional = [
            (self.respondent_email, EMAIL_POINTS),
            (self.respondent_phone, PHONE_POINTS),
            (self.challenges, CHALLENGES_POINTS),
            (self.solutions, SOLUTIONS_POINTS),
        ];
        for (field, bonus) in optional {
            if filled(field) {
                points = points.saturating_add(bonus);
            }
        }

        if self.referred {
            points = points.saturating_add(REFERRAL_BONUS);
        }
        points
    }
}
