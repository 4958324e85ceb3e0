//! Built-in field definitions.
//!
//! Patterns are matched case-insensitively against lower-cased signals.
//! Attribute patterns see raw ids such as `first_name` or
//! `applicant.firstname`; text patterns see label prose.

use super::FieldSpec;

const CONFIRM_WORDS: &str = r"confirm|verify|repeat|retype|re.?enter|again";

pub const BUILTIN_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "confirmEmail",
        weight: 1.0,
        attribute: &[
            r"(confirm|verify|repeat|retype|re.?enter).?e.?mail",
            r"e.?mail.?(confirm|verify|again|2)",
        ],
        text: &[
            r"(confirm|verify|repeat|retype|re-?enter).*e-?mail",
            r"e-?mail.*(again|confirm)",
        ],
        requires: &[CONFIRM_WORDS],
        context_clues: &["contact", "personal"],
        input_types: &["email"],
        profile_path: "personal.email",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "email",
        weight: 1.2,
        attribute: &[r"e.?mail"],
        text: &[r"e-?mail"],
        data_test: &[r"^email"],
        negative: &[CONFIRM_WORDS],
        context_clues: &["contact", "personal"],
        input_types: &["email"],
        profile_path: "personal.email",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "preferredName",
        weight: 0.9,
        attribute: &[r"preferred.?(first.?)?name", r"nick.?name"],
        text: &[r"preferred\s*(first\s*)?name", r"nickname", r"goes by"],
        context_clues: &["personal", "name"],
        profile_path: "personal.preferredName",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "firstName",
        weight: 1.1,
        attribute: &[r"first.?name", r"fname", r"given.?name", r"fore.?name", r"legal.?first"],
        text: &[r"first\s*name", r"given\s*name", r"forename"],
        data_test: &[r"legalnamesection_firstname"],
        negative: &[r"last|sur.?name|family|middle|preferred|company|user"],
        context_clues: &["personal", "name", "contact"],
        profile_path: "personal.firstName",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "middleName",
        weight: 0.9,
        attribute: &[r"middle.?name", r"middle.?initial", r"mname"],
        text: &[r"middle\s*(name|initial)"],
        context_clues: &["personal", "name"],
        profile_path: "personal.middleName",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "lastName",
        weight: 1.1,
        attribute: &[r"last.?name", r"lname", r"sur.?name", r"family.?name", r"legal.?last"],
        text: &[r"last\s*name", r"surname", r"family\s*name"],
        data_test: &[r"legalnamesection_lastname"],
        negative: &[r"first|given|middle|preferred|company"],
        context_clues: &["personal", "name", "contact"],
        profile_path: "personal.lastName",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "fullName",
        weight: 1.0,
        attribute: &[r"full.?name", r"^name$", r"applicant.?name", r"candidate.?name", r"your.?name"],
        text: &[r"full\s*name", r"^name\s*\*?$", r"your name", r"legal name"],
        negative: &[r"first|last|middle|user|company|employer|school|preferred|file|reference|manager"],
        context_clues: &["personal", "contact"],
        profile_path: "personal.fullName",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "phone",
        weight: 1.1,
        attribute: &[r"phone", r"mobile", r"\btel\b", r"cell"],
        text: &[r"phone", r"mobile", r"\bcell\b", r"telephone"],
        data_test: &[r"phone.?number"],
        negative: &[r"confirm|verify|extension|country.?code|phone.?type|device.?type"],
        context_clues: &["contact"],
        input_types: &["tel"],
        profile_path: "personal.phone",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "addressLine2",
        weight: 0.9,
        attribute: &[r"address.?(line.?)?2", r"addr.?2", r"apt|suite|unit"],
        text: &[r"address\s*(line\s*)?2", r"apartment|\bapt\b|suite|\bunit\b"],
        context_clues: &["address"],
        profile_path: "personal.addressLine2",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "address",
        weight: 1.0,
        attribute: &[r"street", r"address.?(line.?)?1", r"^addr(ess)?$", r"home.?address"],
        text: &[r"street", r"^address", r"home address", r"address line 1"],
        data_test: &[r"addressline1"],
        negative: &[r"e-?mail|line\s*2|line.?2|address.?2|web|url"],
        context_clues: &["address", "contact"],
        profile_path: "personal.address",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "city",
        weight: 1.0,
        attribute: &[r"city", r"town", r"locality"],
        text: &[r"\bcity\b", r"\btown\b"],
        negative: &[r"ethnicity|capacity|electricity"],
        context_clues: &["address", "contact"],
        profile_path: "personal.city",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "state",
        weight: 1.0,
        attribute: &[r"state", r"province", r"region"],
        text: &[r"\bstate\b", r"province", r"region"],
        negative: &[r"statement|united.?states|estate"],
        context_clues: &["address"],
        profile_path: "personal.state",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "postalCode",
        weight: 1.0,
        attribute: &[r"zip", r"postal", r"post.?code"],
        text: &[r"\bzip", r"postal", r"post\s*code"],
        context_clues: &["address"],
        profile_path: "personal.postalCode",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "country",
        weight: 1.0,
        attribute: &[r"country"],
        text: &[r"country"],
        negative: &[r"code|phone|dial|citizenship"],
        context_clues: &["address", "contact"],
        input_types: &["select"],
        profile_path: "personal.country",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "linkedin",
        weight: 1.0,
        attribute: &[r"linked.?in"],
        text: &[r"linked\s*in"],
        input_types: &["url"],
        profile_path: "personal.linkedin",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "github",
        weight: 1.0,
        attribute: &[r"git.?hub"],
        text: &[r"git\s*hub"],
        input_types: &["url"],
        profile_path: "personal.github",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "website",
        weight: 0.9,
        attribute: &[r"website", r"portfolio", r"personal.?(site|url)", r"^url$"],
        text: &[r"website", r"portfolio", r"personal\s*(site|url)"],
        negative: &[r"linked.?in|git.?hub|twitter|company"],
        input_types: &["url"],
        profile_path: "personal.website",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "currentCompany",
        weight: 1.0,
        attribute: &[r"current.?(company|employer)", r"company.?name", r"employer", r"organi[sz]ation"],
        text: &[
            r"current\s*(company|employer)",
            r"(most recent|present)\s*(company|employer)",
            r"company name",
            r"employer",
        ],
        negative: &[r"previous|past|title|position|role|school|university"],
        context_clues: &["experience", "employment", "work"],
        profile_path: "workHistory[0].company",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "currentTitle",
        weight: 1.0,
        attribute: &[r"current.?(title|position|role)", r"job.?title", r"^title$", r"position.?title"],
        text: &[r"(current|most recent)\s*(job\s*)?(title|position|role)", r"job title"],
        negative: &[r"applying|desired|company|employer"],
        context_clues: &["experience", "employment", "work"],
        profile_path: "workHistory[0].title",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "yearsExperience",
        weight: 1.0,
        attribute: &[r"years.?(of.?)?experience", r"experience.?years", r"yoe"],
        text: &[r"years\s*(of\s*)?(relevant\s*|professional\s*)?experience"],
        input_types: &["number"],
        profile_path: "preferences.yearsOfExperience",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "school",
        weight: 1.0,
        attribute: &[r"school", r"university", r"college", r"institution"],
        text: &[r"school", r"university", r"college", r"institution"],
        negative: &[r"degree|major|gpa|graduat"],
        context_clues: &["education"],
        profile_path: "education[0].school",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "degree",
        weight: 1.0,
        attribute: &[r"degree"],
        text: &[r"degree"],
        negative: &[r"field|major|subject"],
        context_clues: &["education"],
        profile_path: "education[0].degree",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "fieldOfStudy",
        weight: 1.0,
        attribute: &[r"major", r"field.?of.?study", r"discipline", r"concentration"],
        text: &[r"\bmajor\b", r"field of study", r"discipline", r"area of study"],
        context_clues: &["education"],
        profile_path: "education[0].fieldOfStudy",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "graduationYear",
        weight: 1.0,
        attribute: &[r"grad(uation)?.?(year|date)", r"end.?year"],
        text: &[r"graduation\s*(year|date)", r"year of graduation"],
        context_clues: &["education"],
        profile_path: "education[0].endDate",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "gpa",
        weight: 0.9,
        attribute: &[r"gpa", r"grade.?point"],
        text: &[r"\bgpa\b", r"grade point"],
        context_clues: &["education"],
        profile_path: "education[0].gpa",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "skills",
        weight: 0.8,
        attribute: &[r"skills?$", r"skill.?set"],
        text: &[r"\bskills\b"],
        negative: &[r"level|rating"],
        profile_path: "skills.technical",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "currentSalary",
        weight: 1.0,
        attribute: &[r"current.?(salary|compensation|ctc|pay)"],
        text: &[r"current\s*(annual\s*)?(salary|compensation|ctc|pay)"],
        context_clues: &["compensation", "salary"],
        profile_path: "preferences.currentSalary",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "expectedSalary",
        weight: 1.0,
        attribute: &[
            r"(expected|desired).?(salary|compensation|ctc|pay)",
            r"salary.?(expectation|requirement)",
        ],
        text: &[
            r"(expected|desired)\s*(annual\s*)?(salary|compensation|pay)",
            r"salary\s*(expectation|requirement)s?",
        ],
        negative: &[r"current"],
        context_clues: &["compensation", "salary"],
        profile_path: "preferences.expectedSalary",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "noticePeriod",
        weight: 1.0,
        attribute: &[r"notice.?period"],
        text: &[r"notice\s*period"],
        profile_path: "preferences.noticePeriod",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "startDate",
        weight: 0.9,
        attribute: &[r"(available|earliest).?start", r"start.?date", r"availability"],
        text: &[r"(when|earliest).*start", r"start date", r"availability"],
        input_types: &["date"],
        profile_path: "preferences.availableStartDate",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "workAuthorization",
        weight: 1.0,
        attribute: &[r"work.?auth", r"authori[sz]ed.?to.?work", r"legally.?(authori[sz]ed|eligible)", r"eligib"],
        text: &[
            r"authori[sz]ed to work",
            r"work authori[sz]ation",
            r"legally (authori[sz]ed|eligible)",
            r"right to work",
        ],
        negative: &[r"sponsor"],
        profile_path: "preferences.workAuthorization",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "requiresSponsorship",
        weight: 1.0,
        attribute: &[r"sponsor"],
        text: &[r"sponsor", r"\bvisa\b"],
        profile_path: "preferences.requiresSponsorship",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "willingToRelocate",
        weight: 1.0,
        attribute: &[r"relocat"],
        text: &[r"relocat"],
        profile_path: "preferences.willingToRelocate",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "coverLetter",
        weight: 1.0,
        attribute: &[r"cover.?letter", r"motivation"],
        text: &[r"cover\s*letter", r"motivation"],
        negative: &[r"upload|attach|file"],
        input_types: &["textarea"],
        profile_path: "coverLetters.default",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "summary",
        weight: 0.8,
        attribute: &[r"summary", r"about.?(you|me)", r"\bbio\b"],
        text: &[r"summary", r"about (you|yourself|me)", r"\bbio\b"],
        negative: &[r"cover"],
        input_types: &["textarea"],
        profile_path: "personal.summary",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "pronouns",
        weight: 0.9,
        attribute: &[r"pronoun"],
        text: &[r"pronoun"],
        profile_path: "personal.pronouns",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "gender",
        weight: 0.9,
        attribute: &[r"gender", r"^sex$"],
        text: &[r"gender"],
        negative: &[r"transgender"],
        profile_path: "personal.gender",
        ..FieldSpec::EMPTY
    },
    FieldSpec {
        key: "termsAgreement",
        weight: 0.9,
        attribute: &[r"terms", r"agree", r"consent", r"privacy", r"acknowledg", r"attest"],
        text: &[
            r"i (agree|accept|acknowledge|consent|confirm|certify|attest)",
            r"terms (and|&) conditions",
            r"privacy (policy|notice)",
        ],
        input_types: &["checkbox"],
        auto_check: true,
        ..FieldSpec::EMPTY
    },
];
