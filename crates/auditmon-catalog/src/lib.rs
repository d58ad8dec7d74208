//! Built-in security alarm catalog and the layered configuration merge.
//!
//! Three layers exist: [`defaults`] (always present), [`extras`] (opt-in
//! supplementary checks), and caller overrides. [`effective_catalog`] layers
//! them with last-write-wins-per-name semantics: a later layer's entry for a
//! name replaces the earlier entry wholesale, it never patches individual
//! fields.


use auditmon_common::types::{AlarmCatalog, AlarmDefinition};

fn def(description: &str, pattern: &str) -> AlarmDefinition {
    AlarmDefinition {
        description: description.to_string(),
        pattern: pattern.to_string(),
        threshold: None,
        period_secs: None,
        enabled: None,
    }
}

/// The invariant baseline layer: well-known security-relevant CloudTrail
/// event patterns. Threshold, period and enabled are left unset so each
/// entry inherits the global defaults unless a caller overrides it.
///
/// Patterns are opaque filter expressions; no syntax validation happens
/// here. A malformed pattern is rejected by the resource-creation API at
/// provisioning time.
pub fn defaults() -> AlarmCatalog {
    AlarmCatalog::from([
        (
            "UnauthorizedAPICalls".to_string(),
            def(
                "Monitoring unauthorized API calls will help reveal application errors and may reduce time to detect malicious activity.",
                r#"{(($.errorCode = "*UnauthorizedOperation") || ($.errorCode = "AccessDenied*")) && (($.sourceIPAddress!="delivery.logs.amazonaws.com") && ($.eventName!="HeadBucket"))}"#,
            ),
        ),
        (
            "NoMFAConsoleSignin".to_string(),
            def(
                "Monitoring for single-factor console logins will increase visibility into accounts that are not protected by MFA.",
                r#"{($.eventName = "ConsoleLogin") && ($.additionalEventData.MFAUsed != "Yes") && ($.userIdentity.type = "IAMUser") && ($.responseElements.ConsoleLogin = "Success") }"#,
            ),
        ),
        (
            "RootUsage".to_string(),
            def(
                "Monitoring for root account logins will provide visibility into the use of a fully privileged account and an opportunity to reduce the use of it.",
                r#"{ $.userIdentity.type = "Root" && $.userIdentity.invokedBy NOT EXISTS && $.eventType != "AwsServiceEvent" }"#,
            ),
        ),
        (
            "IAMChanges".to_string(),
            def(
                "Monitoring changes to IAM policies will help ensure authentication and authorization controls remain intact.",
                r#"{($.eventName=DeleteGroupPolicy)||($.eventName=DeleteRolePolicy)||($.eventName=DeleteUserPolicy)||($.eventName=PutGroupPolicy)||($.eventName=PutRolePolicy)||($.eventName=PutUserPolicy)||($.eventName=CreatePolicy)||($.eventName=DeletePolicy)||($.eventName=CreatePolicyVersion)||($.eventName=DeletePolicyVersion)||($.eventName=AttachRolePolicy)||($.eventName=DetachRolePolicy)||($.eventName=AttachUserPolicy)||($.eventName=DetachUserPolicy)||($.eventName=AttachGroupPolicy)||($.eventName=DetachGroupPolicy)}"#,
            ),
        ),
        (
            "CloudTrailCfgChanges".to_string(),
            def(
                "Monitoring changes to CloudTrail's configuration will help ensure sustained visibility to activities performed in the AWS account.",
                r#"{($.eventName = CreateTrail) || ($.eventName = UpdateTrail) || ($.eventName = DeleteTrail) || ($.eventName = StartLogging) || ($.eventName = StopLogging)}"#,
            ),
        ),
        (
            "ConsoleSigninFailures".to_string(),
            def(
                "Monitoring failed console logins may decrease lead time to detect an attempt to brute force a credential, which may provide an indicator, such as source IP, that can be used in other event correlation.",
                r#"{($.eventName = ConsoleLogin) && ($.errorMessage = "Failed authentication")}"#,
            ),
        ),
        (
            "DisableOrDeleteCMK".to_string(),
            def(
                "Monitoring for customer managed keys being disabled or scheduled for deletion may reduce time to detect impending loss of the ability to decrypt data.",
                r#"{($.eventSource = kms.amazonaws.com) && (($.eventName = DisableKey) || ($.eventName = ScheduleKeyDeletion))}"#,
            ),
        ),
        (
            "S3BucketPolicyChanges".to_string(),
            def(
                "Monitoring changes to S3 bucket policies may reduce time to detect and correct permissive policies on sensitive S3 buckets.",
                r#"{($.eventSource = s3.amazonaws.com) && (($.eventName = PutBucketAcl) || ($.eventName = PutBucketPolicy) || ($.eventName = PutBucketCors) || ($.eventName = PutBucketLifecycle) || ($.eventName = PutBucketReplication) || ($.eventName = DeleteBucketPolicy) || ($.eventName = DeleteBucketCors) || ($.eventName = DeleteBucketLifecycle) || ($.eventName = DeleteBucketReplication))}"#,
            ),
        ),
        (
            "AWSConfigChanges".to_string(),
            def(
                "Monitoring changes to AWS Config configuration will help ensure sustained visibility of configuration items within the AWS account.",
                r#"{($.eventSource = config.amazonaws.com) && (($.eventName=StopConfigurationRecorder)||($.eventName=DeleteDeliveryChannel)||($.eventName=PutDeliveryChannel)||($.eventName=PutConfigurationRecorder))}"#,
            ),
        ),
        (
            "SecurityGroupChanges".to_string(),
            def(
                "Monitoring changes to security group will help ensure that resources and services are not unintentionally exposed.",
                r#"{ ($.eventName = AuthorizeSecurityGroupIngress) || ($.eventName = AuthorizeSecurityGroupEgress) || ($.eventName = RevokeSecurityGroupIngress) || ($.eventName = RevokeSecurityGroupEgress) || ($.eventName = CreateSecurityGroup) || ($.eventName = DeleteSecurityGroup)}"#,
            ),
        ),
        (
            "NACLChanges".to_string(),
            def(
                "Monitoring changes to NACLs will help ensure that AWS resources and services are not unintentionally exposed.",
                r#"{($.eventName = CreateNetworkAcl) || ($.eventName = CreateNetworkAclEntry) || ($.eventName = DeleteNetworkAcl) || ($.eventName = DeleteNetworkAclEntry) || ($.eventName = ReplaceNetworkAclEntry) || ($.eventName = ReplaceNetworkAclAssociation)}"#,
            ),
        ),
        (
            "NetworkGWChanges".to_string(),
            def(
                "Monitoring changes to network gateways will help ensure that all ingress/egress traffic traverses the VPC border via a controlled path.",
                r#"{($.eventName = CreateCustomerGateway) || ($.eventName = DeleteCustomerGateway) || ($.eventName = AttachInternetGateway) || ($.eventName = CreateInternetGateway) || ($.eventName = DeleteInternetGateway) || ($.eventName = DetachInternetGateway)}"#,
            ),
        ),
        (
            "RouteTableChanges".to_string(),
            def(
                "Monitoring changes to route tables will help ensure that all VPC traffic flows through an expected path.",
                r#"{ ($.eventName = CreateRoute) || ($.eventName = CreateRouteTable) || ($.eventName = ReplaceRoute) || ($.eventName = ReplaceRouteTableAssociation) || ($.eventName = DeleteRouteTable) || ($.eventName = DeleteRoute) || ($.eventName = DisassociateRouteTable) }"#,
            ),
        ),
        (
            "VPCChanges".to_string(),
            def(
                "Monitoring changes to VPC will help ensure that all VPC traffic flows through an expected path.",
                r#"{($.eventName = CreateVpc) || ($.eventName = DeleteVpc) || ($.eventName = ModifyVpcAttribute) || ($.eventName = AcceptVpcPeeringConnection) || ($.eventName = CreateVpcPeeringConnection) || ($.eventName = DeleteVpcPeeringConnection) || ($.eventName = RejectVpcPeeringConnection) || ($.eventName = AttachClassicLinkVpc) || ($.eventName = DetachClassicLinkVpc) || ($.eventName = DisableVpcClassicLink) || ($.eventName = EnableVpcClassicLink)}"#,
            ),
        ),
        (
            "OrganizationsChanges".to_string(),
            def(
                "Monitoring AWS Organizations changes can help you prevent any unwanted, accidental or intentional modifications that may lead to unauthorized access or other security breaches.",
                r#"{($.eventSource = organizations.amazonaws.com) && (($.eventName = "AcceptHandshake") || ($.eventName = "AttachPolicy") || ($.eventName = "CreateAccount") || ($.eventName = "CreateOrganizationalUnit") || ($.eventName= "CreatePolicy") || ($.eventName = "DeclineHandshake") || ($.eventName = "DeleteOrganization") || ($.eventName = "DeleteOrganizationalUnit") || ($.eventName = "DeletePolicy") || ($.eventName = "DetachPolicy") || ($.eventName = "DisablePolicyType") || ($.eventName = "EnablePolicyType") || ($.eventName = "InviteAccountToOrganization") || ($.eventName = "LeaveOrganization") || ($.eventName = "MoveAccount") || ($.eventName = "RemoveAccountFromOrganization") || ($.eventName = "UpdatePolicy") || ($.eventName ="UpdateOrganizationalUnit"))}"#,
            ),
        ),
    ])
}

/// Supplementary checks beyond the baseline, enabled by an opt-in flag.
pub fn extras() -> AlarmCatalog {
    AlarmCatalog::from([
        (
            "RequestCertificate".to_string(),
            def(
                "Monitoring new certificate requests",
                r#"{ $.eventName = RequestCertificate }"#,
            ),
        ),
        (
            "SendCommand".to_string(),
            // Review invocations with `aws ssm list-command-invocations`
            def(
                "Monitoring use of SSM SendCommand.",
                r#"{ $.eventName = SendCommand }"#,
            ),
        ),
    ])
}

/// Layer defaults, extras (when enabled) and caller overrides into the
/// effective catalog. Each layer's entries replace same-named entries from
/// earlier layers wholesale. Unknown override names simply add new alarms.
pub fn effective_catalog(
    enable_extras: bool,
    overrides: Option<&AlarmCatalog>,
) -> AlarmCatalog {
    let mut catalog = defaults();
    if enable_extras {
        catalog.extend(extras());
    }
    if let Some(overrides) = overrides {
        catalog.extend(overrides.iter().map(|(name, def)| (name.clone(), def.clone())));
    }
    catalog
}
