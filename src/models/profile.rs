/// A student profile as known to the sign-in directory.
#[derive(Clone, Debug)]
pub struct StudentProfile {
    /// The profile's unique identifier; becomes the session subject.
    pub profile_id: String,
    /// The student's login name.
    pub username: String,
    /// Argon2 PHC hash of the student's PIN.
    pub pin_hash: String,
    /// The classroom the student belongs to.
    pub classroom_id: Option<String>,
    /// The institution the student belongs to.
    pub institution_id: Option<String>,
}
