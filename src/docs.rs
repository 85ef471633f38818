use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::activity_logs::model::{ActivityLog, PaginatedActivityLogsResponse};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    ApprovalStatus, ChangePasswordRequestDto, LoginRequest, LogoutRequest, MessageResponse,
    PaginatedPasswordRequestsResponse, PasswordChangeRequestView, RefreshRequest,
    SwitchRoleRequest, TokenResponse,
};
use crate::modules::courses::model::{Course, CreateCourseDto, PaginatedCoursesResponse, UpdateCourseDto};
use crate::modules::enrollments::model::{AssignTeacherDto, EnrollStudentDto, TeacherAssignmentView};
use crate::modules::materials::model::{
    AssignmentKind, CreateAssignmentDto, CreateNotesDto, MaterialDetail, MaterialKind,
    StudentMaterialView, UpdateMaterialDto,
};
use crate::modules::notifications::model::{Notification, PaginatedNotificationsResponse};
use crate::modules::schools::model::{
    AssignPrincipalDto, CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolWithPrincipal,
    UpdateSchoolDto,
};
use crate::modules::signup::model::{
    ApproveSignupDto, CreateSignupRequestDto, PaginatedSignupRequestsResponse, SignupRequestView,
};
use crate::modules::stats::model::{AdminStats, StudentStats, TeacherStats};
use crate::modules::submissions::model::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, Submission,
    SubmissionWithStudent,
};
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserRole, UserView,
};
use crate::utils::pagination::{PaginationMeta, PaginationParams};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::logout_all,
        crate::modules::auth::controller::change_password,
        crate::modules::auth::controller::switch_role,
        crate::modules::auth::controller::list_password_requests,
        crate::modules::auth::controller::approve_password_request,
        crate::modules::auth::controller::reject_password_request,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user_by_id,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::restore_user,
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::get_schools,
        crate::modules::schools::controller::get_school_by_id,
        crate::modules::schools::controller::update_school,
        crate::modules::schools::controller::assign_principal,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course_by_id,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::restore_course,
        crate::modules::materials::controller::create_notes,
        crate::modules::materials::controller::create_assignment,
        crate::modules::materials::controller::get_course_materials,
        crate::modules::materials::controller::get_my_materials,
        crate::modules::materials::controller::update_material,
        crate::modules::materials::controller::delete_material,
        crate::modules::materials::controller::restore_material,
        crate::modules::enrollments::controller::enroll_student,
        crate::modules::enrollments::controller::assign_teacher,
        crate::modules::enrollments::controller::get_teacher_assignments,
        crate::modules::submissions::controller::create_submission,
        crate::modules::submissions::controller::get_student_submissions,
        crate::modules::submissions::controller::get_assignment_submissions,
        crate::modules::submissions::controller::grade_submission,
        crate::modules::notifications::controller::get_notifications,
        crate::modules::notifications::controller::mark_notification_read,
        crate::modules::notifications::controller::mark_all_notifications_read,
        crate::modules::activity_logs::controller::get_activity_logs,
        crate::modules::signup::controller::create_signup_request,
        crate::modules::signup::controller::get_signup_requests,
        crate::modules::signup::controller::approve_signup_request,
        crate::modules::signup::controller::reject_signup_request,
        crate::modules::stats::controller::admin_stats,
        crate::modules::stats::controller::teacher_stats,
        crate::modules::stats::controller::student_stats,
    ),
    components(
        schemas(
            UserRole,
            UserView,
            CreateUserDto,
            UpdateUserDto,
            PaginatedUsersResponse,
            School,
            SchoolWithPrincipal,
            CreateSchoolDto,
            UpdateSchoolDto,
            AssignPrincipalDto,
            PaginatedSchoolsResponse,
            LoginRequest,
            TokenResponse,
            RefreshRequest,
            LogoutRequest,
            ChangePasswordRequestDto,
            SwitchRoleRequest,
            MessageResponse,
            ApprovalStatus,
            PasswordChangeRequestView,
            PaginatedPasswordRequestsResponse,
            ErrorResponse,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            PaginatedCoursesResponse,
            MaterialKind,
            AssignmentKind,
            MaterialDetail,
            StudentMaterialView,
            CreateNotesDto,
            CreateAssignmentDto,
            UpdateMaterialDto,
            EnrollStudentDto,
            AssignTeacherDto,
            TeacherAssignmentView,
            Submission,
            SubmissionWithStudent,
            CreateSubmissionDto,
            GradeSubmissionDto,
            PaginatedSubmissionsResponse,
            Notification,
            PaginatedNotificationsResponse,
            ActivityLog,
            PaginatedActivityLogsResponse,
            SignupRequestView,
            CreateSignupRequestDto,
            ApproveSignupDto,
            PaginatedSignupRequestsResponse,
            AdminStats,
            TeacherStats,
            StudentStats,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token rotation, and password change workflow"),
        (name = "Users", description = "User management endpoints"),
        (name = "Schools", description = "School management endpoints"),
        (name = "Courses", description = "Course catalog endpoints"),
        (name = "Materials", description = "Notes and assignment endpoints"),
        (name = "Enrollments", description = "Student enrollment and teacher assignment"),
        (name = "Submissions", description = "Assignment submission and grading"),
        (name = "Notifications", description = "User notification endpoints"),
        (name = "Activity Logs", description = "Audit trail endpoints"),
        (name = "Signup", description = "Self-service signup workflow"),
        (name = "Stats", description = "Dashboard counters")
    ),
    info(
        title = "Brightboard API",
        version = "0.1.0",
        description = "A multi-tenant school LMS backend built with Rust, Axum, and PostgreSQL featuring JWT authentication with refresh-token rotation.",
        contact(
            name = "API Support",
            email = "support@brightboard.dev"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
